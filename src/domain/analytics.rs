use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Appointment, Cents, Client, ClientId, Product, Transaction};

/// Income and expense sums for a window of transactions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub income: Cents,
    pub expense: Cents,
    pub net: Cents,
}

/// Sum income and expense over whatever window the caller fetched.
/// The aggregation does not filter by date or status; it counts every
/// transaction handed in.
pub fn period_totals(transactions: &[Transaction]) -> PeriodTotals {
    let mut totals = PeriodTotals::default();
    for tx in transactions {
        match tx.kind {
            super::TransactionKind::Income => totals.income += tx.amount_cents,
            super::TransactionKind::Expense => totals.expense += tx.amount_cents,
        }
    }
    totals.net = totals.income - totals.expense;
    totals
}

/// Comparison of a window against the immediately preceding window of equal
/// length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub change: Cents,
    pub change_percentage: f64,
}

pub fn compare_periods(current: PeriodTotals, previous: PeriodTotals) -> PeriodComparison {
    let change = current.net - previous.net;
    let change_percentage = if previous.net != 0 {
        change as f64 / previous.net.abs() as f64 * 100.0
    } else if change != 0 {
        100.0 * change.signum() as f64
    } else {
        0.0
    };
    PeriodComparison {
        current,
        previous,
        change,
        change_percentage,
    }
}

/// One calendar day of the income-vs-expense series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFlow {
    pub day: NaiveDate,
    pub income: Cents,
    pub expense: Cents,
}

/// Day-by-day bucketed income vs. expense over an inclusive date range, one
/// bucket per calendar day. Days without transactions appear with zero sums;
/// transactions outside the range are ignored.
pub fn daily_flow(from: NaiveDate, to: NaiveDate, transactions: &[Transaction]) -> Vec<DailyFlow> {
    let mut buckets = Vec::new();
    let mut day = from;
    while day <= to {
        buckets.push(DailyFlow {
            day,
            income: 0,
            expense: 0,
        });
        day += Duration::days(1);
    }

    for tx in transactions {
        let tx_day = tx.occurred_at.date_naive();
        if tx_day < from || tx_day > to {
            continue;
        }
        let idx = (tx_day - from).num_days() as usize;
        match tx.kind {
            super::TransactionKind::Income => buckets[idx].income += tx.amount_cents,
            super::TransactionKind::Expense => buckets[idx].expense += tx.amount_cents,
        }
    }

    buckets
}

/// Per-category share of income for the distribution chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    pub percentage: f64,
}

/// Category-keyed sums of income only, sorted by total descending with the
/// category name as tie-break.
pub fn income_by_category(transactions: &[Transaction]) -> Vec<CategorySummary> {
    use std::collections::HashMap;

    let mut sums: HashMap<&str, (Cents, i64)> = HashMap::new();
    let mut total_income: Cents = 0;

    for tx in transactions.iter().filter(|t| t.is_income()) {
        let entry = sums.entry(tx.category.as_str()).or_insert((0, 0));
        entry.0 += tx.amount_cents;
        entry.1 += 1;
        total_income += tx.amount_cents;
    }

    let mut categories: Vec<CategorySummary> = sums
        .into_iter()
        .map(|(category, (total, count))| CategorySummary {
            category: category.to_string(),
            total,
            count,
            percentage: if total_income > 0 {
                total as f64 / total_income as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    categories.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
    categories
}

/// A client ranked by lifetime value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientValue {
    pub client_id: ClientId,
    pub name: String,
    /// Sum of the client's income transactions across all time
    pub total_spent: Cents,
}

/// Lifetime-value ranking: for each client, sum all of their income
/// transactions over unbounded history. Zero-spend clients are excluded and
/// the top `top_n` retained, sorted descending by total (name ascending as
/// tie-break so equal totals order deterministically). O(clients ×
/// transactions) nested scan; both collections are single-studio small.
pub fn rank_clients_by_value(
    clients: &[Client],
    transactions: &[Transaction],
    top_n: usize,
) -> Vec<ClientValue> {
    let mut ranked: Vec<ClientValue> = clients
        .iter()
        .map(|client| {
            let total_spent = transactions
                .iter()
                .filter(|tx| tx.is_income() && tx.client_id == Some(client.id))
                .map(|tx| tx.amount_cents)
                .sum();
            ClientValue {
                client_id: client.id,
                name: client.name.clone(),
                total_spent,
            }
        })
        .filter(|cv| cv.total_spent > 0)
        .collect();

    ranked.sort_by(|a, b| b.total_spent.cmp(&a.total_spent).then(a.name.cmp(&b.name)));
    ranked.truncate(top_n);
    ranked
}

/// A client flagged by the churn heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtRiskClient {
    pub client_id: ClientId,
    pub name: String,
    pub whatsapp: Option<String>,
    pub last_appointment: DateTime<Utc>,
    pub days_since: i64,
}

/// Days without an appointment after which a client counts as at risk.
pub const CHURN_THRESHOLD_DAYS: i64 = 45;

/// Churn heuristic: a client is at risk iff their most recent appointment is
/// more than `threshold_days` in the past. Appointments are matched by
/// client id only; clients with no appointments are never flagged. Result is
/// sorted by days-since descending (name ascending as tie-break).
pub fn at_risk_clients(
    clients: &[Client],
    appointments: &[Appointment],
    today: DateTime<Utc>,
    threshold_days: i64,
) -> Vec<AtRiskClient> {
    let mut at_risk: Vec<AtRiskClient> = clients
        .iter()
        .filter_map(|client| {
            let last = appointments
                .iter()
                .filter(|a| a.client_id == client.id)
                .map(|a| a.scheduled_at)
                .max()?;
            let days_since = (today - last).num_days();
            if days_since > threshold_days {
                Some(AtRiskClient {
                    client_id: client.id,
                    name: client.name.clone(),
                    whatsapp: client.whatsapp.clone(),
                    last_appointment: last,
                    days_since,
                })
            } else {
                None
            }
        })
        .collect();

    at_risk.sort_by(|a, b| b.days_since.cmp(&a.days_since).then(a.name.cmp(&b.name)));
    at_risk
}

/// Money tied up in stock at cost price, across all products.
pub fn capital_at_risk(products: &[Product]) -> Cents {
    products.iter().map(|p| p.capital_at_cost()).sum()
}

/// Products whose stock fell below their reorder threshold.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::super::{TransactionKind, TransactionStatus};
    use super::*;

    fn date(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}T12:00:00Z", s))
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tx(kind: TransactionKind, amount: Cents, day: &str) -> Transaction {
        Transaction::new(kind, amount, "comanda".into(), date(day))
    }

    fn tx_for_client(client_id: ClientId, amount: Cents, day: &str) -> Transaction {
        tx(TransactionKind::Income, amount, day).with_client(client_id)
    }

    #[test]
    fn test_period_totals_net_is_income_minus_expense() {
        // income 100.00, expense 40.00 -> net 60.00
        let transactions = vec![
            tx(TransactionKind::Income, 10000, "2024-03-01"),
            tx(TransactionKind::Expense, 4000, "2024-03-02"),
        ];
        let totals = period_totals(&transactions);
        assert_eq!(totals.income, 10000);
        assert_eq!(totals.expense, 4000);
        assert_eq!(totals.net, 6000);
    }

    #[test]
    fn test_period_totals_empty() {
        let totals = period_totals(&[]);
        assert_eq!(totals.income, 0);
        assert_eq!(totals.expense, 0);
        assert_eq!(totals.net, 0);
    }

    #[test]
    fn test_period_totals_counts_pending_and_settled_alike() {
        // The aggregation counts whatever the caller fetched; status is data,
        // not a filter.
        let transactions = vec![
            tx(TransactionKind::Income, 5000, "2024-03-01"),
            tx(TransactionKind::Income, 3000, "2024-03-01").with_status(TransactionStatus::Pending),
        ];
        assert_eq!(period_totals(&transactions).income, 8000);
    }

    #[test]
    fn test_compare_periods() {
        let current = period_totals(&[tx(TransactionKind::Income, 20000, "2024-03-05")]);
        let previous = period_totals(&[tx(TransactionKind::Income, 10000, "2024-02-05")]);
        let cmp = compare_periods(current, previous);
        assert_eq!(cmp.change, 10000);
        assert!((cmp.change_percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_periods_zero_previous() {
        let current = period_totals(&[tx(TransactionKind::Income, 5000, "2024-03-05")]);
        let cmp = compare_periods(current, PeriodTotals::default());
        assert_eq!(cmp.change, 5000);
        assert!((cmp.change_percentage - 100.0).abs() < f64::EPSILON);

        let flat = compare_periods(PeriodTotals::default(), PeriodTotals::default());
        assert_eq!(flat.change_percentage, 0.0);
    }

    #[test]
    fn test_daily_flow_one_bucket_per_day() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let transactions = vec![
            tx(TransactionKind::Income, 10000, "2024-03-01"),
            tx(TransactionKind::Income, 2500, "2024-03-01"),
            tx(TransactionKind::Expense, 4000, "2024-03-03"),
            // Outside the window: ignored
            tx(TransactionKind::Income, 99999, "2024-03-08"),
        ];

        let series = daily_flow(from, to, &transactions);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].income, 12500);
        assert_eq!(series[0].expense, 0);
        assert_eq!(series[2].expense, 4000);
        // Empty day still present
        assert_eq!(series[6].income, 0);
        assert_eq!(series[6].expense, 0);
    }

    #[test]
    fn test_income_by_category_excludes_expenses() {
        let transactions = vec![
            tx(TransactionKind::Income, 10000, "2024-03-01"),
            tx(TransactionKind::Expense, 9000, "2024-03-01"),
            Transaction::new(
                TransactionKind::Income,
                5000,
                "produtos".into(),
                date("2024-03-02"),
            ),
        ];

        let categories = income_by_category(&transactions);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "comanda");
        assert_eq!(categories[0].total, 10000);
        assert!((categories[0].percentage - 66.66).abs() < 0.1);
        assert_eq!(categories[1].category, "produtos");
    }

    #[test]
    fn test_ltv_ranking_orders_and_excludes_zero_spend() {
        let ana = Client::new("Ana".into());
        let bia = Client::new("Bia".into());
        let nunca = Client::new("Nunca Comprou".into());

        let transactions = vec![
            tx_for_client(ana.id, 10000, "2023-01-10"),
            tx_for_client(bia.id, 30000, "2022-06-01"),
            tx_for_client(ana.id, 5000, "2024-02-01"),
            // Expense attributed to a client must not count toward LTV
            tx(TransactionKind::Expense, 7000, "2024-01-01").with_client(bia.id),
        ];

        let clients = vec![ana.clone(), bia.clone(), nunca];
        let ranked = rank_clients_by_value(&clients, &transactions, 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Bia");
        assert_eq!(ranked[0].total_spent, 30000);
        assert_eq!(ranked[1].name, "Ana");
        assert_eq!(ranked[1].total_spent, 15000);
    }

    #[test]
    fn test_ltv_ranking_stable_under_input_reordering() {
        let ana = Client::new("Ana".into());
        let bia = Client::new("Bia".into());
        let clients = vec![ana.clone(), bia.clone()];

        let mut transactions = vec![
            tx_for_client(ana.id, 1000, "2024-01-01"),
            tx_for_client(bia.id, 2000, "2024-01-02"),
            tx_for_client(ana.id, 3000, "2024-01-03"),
            tx_for_client(bia.id, 500, "2024-01-04"),
        ];

        let forward = rank_clients_by_value(&clients, &transactions, 10);
        transactions.reverse();
        let reversed = rank_clients_by_value(&clients, &transactions, 10);

        assert_eq!(forward.len(), reversed.len());
        for (a, b) in forward.iter().zip(reversed.iter()) {
            assert_eq!(a.client_id, b.client_id);
            assert_eq!(a.total_spent, b.total_spent);
        }
    }

    #[test]
    fn test_ltv_ranking_truncates_to_top_n() {
        let clients: Vec<Client> = (0..15).map(|i| Client::new(format!("C{i:02}"))).collect();
        let transactions: Vec<Transaction> = clients
            .iter()
            .enumerate()
            .map(|(i, c)| tx_for_client(c.id, (i as i64 + 1) * 100, "2024-01-01"))
            .collect();

        let ranked = rank_clients_by_value(&clients, &transactions, 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].total_spent, 1500);
    }

    fn appointment_for(client: &Client, day: &str) -> Appointment {
        Appointment::new(client.id, client.name.clone(), "corte".into(), date(day), 60)
    }

    #[test]
    fn test_churn_flags_only_past_threshold() {
        let today = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sumida = Client::new("Sumida".into());
        let recente = Client::new("Recente".into());
        let nova = Client::new("Nova Sem Visita".into());

        let appointments = vec![
            appointment_for(&sumida, "2024-01-01"),  // 60 days before
            appointment_for(&recente, "2024-02-20"), // 10 days before
        ];

        let clients = vec![sumida.clone(), recente, nova];
        let flagged = at_risk_clients(&clients, &appointments, today, CHURN_THRESHOLD_DAYS);

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].client_id, sumida.id);
        assert_eq!(flagged[0].days_since, 60);
    }

    #[test]
    fn test_churn_uses_most_recent_appointment() {
        let today = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let client = Client::new("Vai E Volta".into());

        // Old visit would flag her, but a recent one supersedes it
        let appointments = vec![
            appointment_for(&client, "2023-06-01"),
            appointment_for(&client, "2024-02-25"),
        ];

        let flagged = at_risk_clients(
            &[client],
            &appointments,
            today,
            CHURN_THRESHOLD_DAYS,
        );
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_churn_exact_threshold_not_flagged() {
        let today = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let client = Client::new("Na Borda".into());
        // Exactly 45 days before: strictly-greater-than means not flagged
        let appointments = vec![appointment_for(&client, "2024-01-16")];

        let flagged = at_risk_clients(
            &[client],
            &appointments,
            today,
            CHURN_THRESHOLD_DAYS,
        );
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_churn_ignores_same_name_different_client() {
        // Two distinct clients sharing a display name must not conflate:
        // matching is by id only.
        let today = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let maria_a = Client::new("Maria Silva".into());
        let maria_b = Client::new("Maria Silva".into());

        // Only maria_b visited recently
        let appointments = vec![
            appointment_for(&maria_a, "2023-12-01"),
            appointment_for(&maria_b, "2024-02-28"),
        ];

        let flagged = at_risk_clients(
            &[maria_a.clone(), maria_b],
            &appointments,
            today,
            CHURN_THRESHOLD_DAYS,
        );
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].client_id, maria_a.id);
    }

    #[test]
    fn test_inventory_sums() {
        let products = vec![
            Product::new("Shampoo".into(), 4, 1500, 4500, 3),
            Product::new("Pomada".into(), 1, 2200, 5900, 2),
        ];
        assert_eq!(capital_at_risk(&products), 4 * 1500 + 2200);

        let low = low_stock(&products);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Pomada");
    }
}
