use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AtRiskClient, CategorySummary, Cents, ClientValue, DailyFlow, PeriodTotals, Product,
};

/// Headline numbers for a period, compared against the immediately
/// preceding period of equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub change: Cents,
    pub change_percentage: f64,
    pub top_categories: Vec<CategorySummary>,
}

/// Day-by-day income vs. expense series for charting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFlowReport {
    pub from_day: NaiveDate,
    pub to_day: NaiveDate,
    pub days: Vec<DailyFlow>,
}

/// Income distribution by category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total_income: Cents,
    pub categories: Vec<CategorySummary>,
}

/// Lifetime-value top clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopClientsReport {
    pub clients: Vec<ClientValue>,
}

/// Clients who have not visited for longer than the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnReport {
    pub threshold_days: i64,
    pub clients: Vec<AtRiskClient>,
}

/// Stock capital and reorder candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReport {
    pub capital_at_risk: Cents,
    pub low_stock: Vec<Product>,
}
