use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClientId, ProfessionalId};

pub type AppointmentId = Uuid;

/// Lifecycle status of an appointment. Wire strings are the Portuguese terms
/// the studio actually uses on the agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Booked, not yet confirmed by the client
    #[serde(rename = "agendado")]
    Scheduled,
    /// Client confirmed they are coming
    #[serde(rename = "confirmado")]
    Confirmed,
    /// Visit happened
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "agendado",
            AppointmentStatus::Confirmed => "confirmado",
            AppointmentStatus::Completed => "concluido",
            AppointmentStatus::Cancelled => "cancelado",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "agendado" => Some(AppointmentStatus::Scheduled),
            "confirmado" => Some(AppointmentStatus::Confirmed),
            "concluido" => Some(AppointmentStatus::Completed),
            "cancelado" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    /// Completed appointments are terminal; cancellation is allowed from any
    /// state that has not yet happened.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed)
                | (Scheduled, Completed)
                | (Confirmed, Completed)
                | (Scheduled, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A booked visit. `client_name` is a display snapshot taken at booking time
/// so agenda listings don't need a join; `client_id` is the identity used by
/// every computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub client_name: String,
    pub professional_id: Option<ProfessionalId>,
    /// Service description (e.g. "corte", "coloracao", "tatuagem braço")
    pub service: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(
        client_id: ClientId,
        client_name: String,
        service: String,
        scheduled_at: DateTime<Utc>,
        duration_min: i64,
    ) -> Self {
        assert!(duration_min > 0, "Appointment duration must be positive");
        Self {
            id: Uuid::new_v4(),
            client_id,
            client_name,
            professional_id: None,
            service,
            scheduled_at,
            duration_min,
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_professional(mut self, professional_id: ProfessionalId) -> Self {
        self.professional_id = Some(professional_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            let s = status.as_str();
            let parsed = AppointmentStatus::from_str(s).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_allowed_transitions() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Scheduled.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        use AppointmentStatus::*;
        // Completed is terminal
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Confirmed));
        // Cancelled is terminal
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!Cancelled.can_transition_to(Completed));
        // No going backwards
        assert!(!Confirmed.can_transition_to(Scheduled));
    }

    #[test]
    fn test_new_appointment_starts_scheduled() {
        let appt = Appointment::new(
            Uuid::new_v4(),
            "Ana".into(),
            "corte".into(),
            Utc::now(),
            60,
        );
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert!(!appt.is_cancelled());
    }

    #[test]
    #[should_panic(expected = "duration must be positive")]
    fn test_appointment_requires_positive_duration() {
        Appointment::new(Uuid::new_v4(), "Ana".into(), "corte".into(), Utc::now(), 0);
    }
}
