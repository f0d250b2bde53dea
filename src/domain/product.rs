use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type ProductId = Uuid;

/// A retail or consumable product kept in stock (shampoo, ink, gift kits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock_quantity: i64,
    /// What the studio paid per unit
    pub cost_price_cents: Cents,
    /// What the studio charges per unit
    pub sale_price_cents: Cents,
    /// Reorder threshold; stock below this shows up in the low-stock report
    pub min_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: String,
        stock_quantity: i64,
        cost_price_cents: Cents,
        sale_price_cents: Cents,
        min_stock: i64,
    ) -> Self {
        assert!(stock_quantity >= 0, "Stock must not be negative");
        assert!(
            cost_price_cents >= 0 && sale_price_cents >= 0,
            "Prices must not be negative"
        );
        Self {
            id: Uuid::new_v4(),
            name,
            stock_quantity,
            cost_price_cents,
            sale_price_cents,
            min_stock,
            created_at: Utc::now(),
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity < self.min_stock
    }

    /// Money tied up in this product's stock at cost price.
    pub fn capital_at_cost(&self) -> Cents {
        self.stock_quantity * self.cost_price_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock() {
        let product = Product::new("Shampoo".into(), 2, 1500, 4500, 3);
        assert!(product.is_low_stock());

        let stocked = Product::new("Condicionador".into(), 3, 1500, 4500, 3);
        assert!(!stocked.is_low_stock());
    }

    #[test]
    fn test_capital_at_cost() {
        let product = Product::new("Pomada".into(), 10, 2200, 5900, 2);
        assert_eq!(product.capital_at_cost(), 22000);
    }
}
