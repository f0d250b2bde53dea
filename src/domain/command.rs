use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ClientId, PaymentMethodId, ProductId, ProfessionalId};

pub type CommandId = Uuid;
pub type CommandItemId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Open,
    Closed,
    Cancelled,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Open => "open",
            CommandStatus::Closed => "closed",
            CommandStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(CommandStatus::Open),
            "closed" => Some(CommandStatus::Closed),
            "cancelled" => Some(CommandStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandItemKind {
    /// A service performed by a professional
    Service,
    /// A retail product taken from stock
    Product,
}

impl CommandItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandItemKind::Service => "service",
            CommandItemKind::Product => "product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "service" => Some(CommandItemKind::Service),
            "product" => Some(CommandItemKind::Product),
            _ => None,
        }
    }
}

/// One line on a comanda.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandItem {
    pub id: CommandItemId,
    pub command_id: CommandId,
    pub kind: CommandItemKind,
    pub description: String,
    pub professional_id: Option<ProfessionalId>,
    pub product_id: Option<ProductId>,
    pub quantity: i64,
    pub unit_price_cents: Cents,
}

impl CommandItem {
    pub fn service(
        command_id: CommandId,
        description: String,
        professional_id: Option<ProfessionalId>,
        unit_price_cents: Cents,
    ) -> Self {
        assert!(unit_price_cents >= 0, "Price must not be negative");
        Self {
            id: Uuid::new_v4(),
            command_id,
            kind: CommandItemKind::Service,
            description,
            professional_id,
            product_id: None,
            quantity: 1,
            unit_price_cents,
        }
    }

    pub fn product(
        command_id: CommandId,
        description: String,
        product_id: ProductId,
        quantity: i64,
        unit_price_cents: Cents,
    ) -> Self {
        assert!(quantity > 0, "Quantity must be positive");
        assert!(unit_price_cents >= 0, "Price must not be negative");
        Self {
            id: Uuid::new_v4(),
            command_id,
            kind: CommandItemKind::Product,
            description,
            professional_id: None,
            product_id: Some(product_id),
            quantity,
            unit_price_cents,
        }
    }

    pub fn total_cents(&self) -> Cents {
        self.quantity * self.unit_price_cents
    }
}

/// An open tab of services and products for a client visit, closed out via
/// one or more payments (glossary: "comanda").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub client_id: ClientId,
    pub status: CommandStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Command {
    pub fn open(client_id: ClientId) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            status: CommandStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == CommandStatus::Open
    }
}

/// One payment tendered when closing a comanda.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandPayment {
    pub payment_method_id: PaymentMethodId,
    pub amount_cents: Cents,
}

/// Sum of all line items.
pub fn command_total(items: &[CommandItem]) -> Cents {
    items.iter().map(|i| i.total_cents()).sum()
}

/// Validate that tendered payments exactly cover the comanda total.
/// Split payments are fine; over- and underpayment are not.
pub fn validate_payments(
    total_cents: Cents,
    payments: &[CommandPayment],
) -> Result<(), PaymentMismatchError> {
    if payments.is_empty() {
        return Err(PaymentMismatchError {
            total: total_cents,
            tendered: 0,
        });
    }
    let tendered: Cents = payments.iter().map(|p| p.amount_cents).sum();
    if tendered != total_cents {
        return Err(PaymentMismatchError {
            total: total_cents,
            tendered,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMismatchError {
    pub total: Cents,
    pub tendered: Cents,
}

impl std::fmt::Display for PaymentMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Payments of {} cents do not match comanda total of {} cents",
            self.tendered, self.total
        )
    }
}

impl std::error::Error for PaymentMismatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items(command_id: CommandId) -> Vec<CommandItem> {
        vec![
            CommandItem::service(command_id, "corte".into(), None, 8000),
            CommandItem::product(command_id, "pomada".into(), Uuid::new_v4(), 2, 2500),
        ]
    }

    #[test]
    fn test_command_total() {
        let command = Command::open(Uuid::new_v4());
        let items = sample_items(command.id);
        assert_eq!(command_total(&items), 13000);
    }

    #[test]
    fn test_validate_payments_exact_single() {
        let payments = vec![CommandPayment {
            payment_method_id: Uuid::new_v4(),
            amount_cents: 13000,
        }];
        assert!(validate_payments(13000, &payments).is_ok());
    }

    #[test]
    fn test_validate_payments_split() {
        let payments = vec![
            CommandPayment {
                payment_method_id: Uuid::new_v4(),
                amount_cents: 10000,
            },
            CommandPayment {
                payment_method_id: Uuid::new_v4(),
                amount_cents: 3000,
            },
        ];
        assert!(validate_payments(13000, &payments).is_ok());
    }

    #[test]
    fn test_validate_payments_mismatch() {
        let payments = vec![CommandPayment {
            payment_method_id: Uuid::new_v4(),
            amount_cents: 12000,
        }];
        let err = validate_payments(13000, &payments).unwrap_err();
        assert_eq!(err.total, 13000);
        assert_eq!(err.tendered, 12000);
    }

    #[test]
    fn test_validate_payments_empty() {
        assert!(validate_payments(1000, &[]).is_err());
    }

    #[test]
    fn test_empty_comanda_with_zero_payment_rejected() {
        // Closing an empty comanda still requires no payments to be tendered
        // as a mismatch, not as success.
        assert!(validate_payments(0, &[]).is_err());
    }
}
