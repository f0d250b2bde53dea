use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type PaymentMethodId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Cash,
    Pix,
    Debit,
    Credit,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Cash => "cash",
            PaymentKind::Pix => "pix",
            PaymentKind::Debit => "debit",
            PaymentKind::Credit => "credit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" | "dinheiro" => Some(PaymentKind::Cash),
            "pix" => Some(PaymentKind::Pix),
            "debit" | "debito" => Some(PaymentKind::Debit),
            "credit" | "credito" => Some(PaymentKind::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A configured way of getting paid. The acquirer fee is stored in basis
/// points so the checkout can show what the studio actually receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub kind: PaymentKind,
    /// Acquirer fee in basis points (e.g. 349 = 3.49%)
    pub fee_bps: i64,
    pub max_installments: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(name: String, kind: PaymentKind, fee_bps: i64, max_installments: i64) -> Self {
        assert!(
            (0..=10_000).contains(&fee_bps),
            "Fee must be between 0 and 10000 basis points"
        );
        assert!(max_installments >= 1, "Installments must be at least 1");
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            fee_bps,
            max_installments,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Fee withheld by the acquirer for a gross amount, floor division.
    pub fn fee_for(&self, gross_cents: Cents) -> Cents {
        gross_cents * self.fee_bps / 10_000
    }

    /// What the studio receives after the acquirer fee.
    pub fn net_amount(&self, gross_cents: Cents) -> Cents {
        gross_cents - self.fee_for(gross_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            PaymentKind::Cash,
            PaymentKind::Pix,
            PaymentKind::Debit,
            PaymentKind::Credit,
        ] {
            assert_eq!(PaymentKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_kind_accepts_portuguese_aliases() {
        assert_eq!(PaymentKind::from_str("dinheiro"), Some(PaymentKind::Cash));
        assert_eq!(PaymentKind::from_str("credito"), Some(PaymentKind::Credit));
    }

    #[test]
    fn test_fee_math() {
        let method = PaymentMethod::new("Cartao credito".into(), PaymentKind::Credit, 349, 12);
        // 3.49% of R$ 100.00 = R$ 3.49
        assert_eq!(method.fee_for(10000), 349);
        assert_eq!(method.net_amount(10000), 9651);
        // Floor division on odd amounts
        assert_eq!(method.fee_for(999), 34);
    }

    #[test]
    fn test_zero_fee_cash() {
        let method = PaymentMethod::new("Dinheiro".into(), PaymentKind::Cash, 0, 1);
        assert_eq!(method.net_amount(12345), 12345);
    }

    #[test]
    #[should_panic(expected = "Installments must be at least 1")]
    fn test_installments_validated() {
        PaymentMethod::new("X".into(), PaymentKind::Pix, 0, 0);
    }
}
