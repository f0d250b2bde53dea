use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClientId;

pub type AnamnesisId = Uuid;

/// The intake questions every new client answers before a procedure.
/// Studios append free-form questions on top of these.
pub const STANDARD_QUESTIONS: &[&str] = &[
    "Possui alergia a algum produto ou medicamento?",
    "Está gestante ou amamentando?",
    "Possui diabetes, hipertensão ou problema circulatório?",
    "Fez algum procedimento estético nos últimos 30 dias?",
    "Usa ácidos ou medicação dermatológica?",
    "Possui histórico de queloide ou cicatrização difícil?",
];

/// One answered question. `contraindication` marks answers the professional
/// judged relevant enough to block or adapt a procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnamnesisAnswer {
    pub question: String,
    pub answer: String,
    pub contraindication: bool,
}

/// A medical/cosmetic intake questionnaire and consent record for a client.
/// Answers are kept as an ordered list; the storage layer serializes them as
/// a JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnamnesisForm {
    pub id: AnamnesisId,
    pub client_id: ClientId,
    pub answers: Vec<AnamnesisAnswer>,
    /// Client consented to the procedure and to the use of their data
    pub consent: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AnamnesisForm {
    pub fn new(client_id: ClientId, answers: Vec<AnamnesisAnswer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            answers,
            consent: false,
            signed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the form as consented and signed. Returns false (and leaves the
    /// form untouched) when consent was not given.
    pub fn sign(&mut self, consent: bool, now: DateTime<Utc>) -> bool {
        if !consent {
            return false;
        }
        self.consent = true;
        self.signed_at = Some(now);
        true
    }

    pub fn is_signed(&self) -> bool {
        self.consent && self.signed_at.is_some()
    }

    /// Answers the professional flagged as contraindications.
    pub fn contraindications(&self) -> Vec<&AnamnesisAnswer> {
        self.answers.iter().filter(|a| a.contraindication).collect()
    }
}
