use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ClientId, PaymentMethodId};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering the studio (service payments, product sales)
    Income,
    /// Money leaving the studio (rent, supplies, commissions)
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Settled,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Settled => "settled",
            TransactionStatus::Reversed => "reversed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(TransactionStatus::Pending),
            "settled" => Some(TransactionStatus::Settled),
            "reversed" => Some(TransactionStatus::Reversed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A money movement. Amounts are always non-negative; direction is carried
/// by `kind`. Income from a client visit links back to the client and the
/// payment method used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// When the money moved in the real world
    pub occurred_at: DateTime<Utc>,
    /// When we recorded it
    pub recorded_at: DateTime<Utc>,
    pub kind: TransactionKind,
    /// Amount in centavos (never negative)
    pub amount_cents: Cents,
    /// Category for reporting (e.g. "comanda", "aluguel", "insumos")
    pub category: String,
    pub description: Option<String>,
    pub client_id: Option<ClientId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub status: TransactionStatus,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount_cents: Cents,
        category: String,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents >= 0, "Transaction amount must not be negative");
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            recorded_at: Utc::now(),
            kind,
            amount_cents,
            category,
            description: None,
            client_id: None,
            payment_method_id: None,
            status: TransactionStatus::Settled,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_payment_method(mut self, payment_method_id: PaymentMethodId) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transaction() {
        let tx = Transaction::new(
            TransactionKind::Income,
            8990,
            "comanda".into(),
            Utc::now(),
        )
        .with_description("corte + escova");

        assert_eq!(tx.amount_cents, 8990);
        assert!(tx.is_income());
        assert_eq!(tx.status, TransactionStatus::Settled);
        assert_eq!(tx.description.as_deref(), Some("corte + escova"));
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Settled,
            TransactionStatus::Reversed,
        ] {
            assert_eq!(TransactionStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    #[should_panic(expected = "must not be negative")]
    fn test_transaction_rejects_negative_amount() {
        Transaction::new(TransactionKind::Expense, -1, "x".into(), Utc::now());
    }
}
