use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProfessionalId = Uuid;

/// A team member who performs services (hairdresser, esthetician, tattoo
/// artist, ...). Commission is stored in basis points of the service price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: ProfessionalId,
    pub name: String,
    pub role: String,
    /// Commission in basis points (e.g. 4000 = 40% of the service price)
    pub commission_bps: i64,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Professional {
    pub fn new(name: String, role: String, commission_bps: i64) -> Self {
        assert!(
            (0..=10_000).contains(&commission_bps),
            "Commission must be between 0 and 10000 basis points"
        );
        Self {
            id: Uuid::new_v4(),
            name,
            role,
            commission_bps,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Commission owed for a service of the given price, floor division.
    pub fn commission_for(&self, price_cents: super::Cents) -> super::Cents {
        price_cents * self.commission_bps / 10_000
    }
}
