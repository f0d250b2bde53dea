use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ClientId = Uuid;

/// A client of the studio. Contact and document fields are optional because
/// records often start as just a name taken over WhatsApp and get completed
/// later (before a contract or anamnesis requires them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// WhatsApp number, digits only, as the studio dials it
    pub whatsapp: Option<String>,
    /// CPF or equivalent identity document number
    pub document: Option<String>,
    pub address: Option<String>,
    /// How the client found the studio (instagram, indication, walk-in, ...)
    pub referral_source: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            whatsapp: None,
            document: None,
            address: None,
            referral_source: None,
            notes: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn with_whatsapp(mut self, whatsapp: impl Into<String>) -> Self {
        self.whatsapp = Some(whatsapp.into());
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_referral_source(mut self, source: impl Into<String>) -> Self {
        self.referral_source = Some(source.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_active() {
        let client = Client::new("Ana Souza".into());
        assert!(!client.is_archived());
        assert_eq!(client.name, "Ana Souza");
        assert!(client.whatsapp.is_none());
    }

    #[test]
    fn test_builder_fields() {
        let client = Client::new("Bruna Lima".into())
            .with_whatsapp("5511999990000")
            .with_document("123.456.789-09")
            .with_referral_source("instagram");

        assert_eq!(client.whatsapp.as_deref(), Some("5511999990000"));
        assert_eq!(client.document.as_deref(), Some("123.456.789-09"));
        assert_eq!(client.referral_source.as_deref(), Some("instagram"));
    }
}
