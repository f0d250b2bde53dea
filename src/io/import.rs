use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Read;

use crate::application::{AppError, StudioService};
use crate::domain::{parse_amount, TransactionKind};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
    pub validate_only: bool,
}

/// Importer for loading data into the studio database
pub struct Importer<'a> {
    service: &'a StudioService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a StudioService) -> Self {
        Self { service }
    }

    /// Import clients from CSV.
    /// Expected columns: name, whatsapp, document, referral_source
    pub async fn import_clients_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let name = record.get(0).unwrap_or("").trim();
            if name.is_empty() {
                errors.push(ImportError {
                    line,
                    field: Some("name".to_string()),
                    error: "Name is required".to_string(),
                });
                continue;
            }

            let whatsapp = non_empty(record.get(1));
            let document = non_empty(record.get(2));
            let referral_source = non_empty(record.get(3));

            if options.dry_run || options.validate_only {
                imported += 1;
                continue;
            }

            match self
                .service
                .create_client(
                    name.to_string(),
                    whatsapp,
                    document,
                    None,
                    referral_source,
                    None,
                )
                .await
            {
                Ok(_) => imported += 1,
                Err(AppError::ClientAlreadyExists(_)) if options.skip_duplicates => {
                    skipped += 1;
                }
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("Client creation failed: {}", e),
                    });
                }
            }
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }

    /// Import transactions from CSV.
    /// Expected columns: date, kind, amount, category, description
    pub async fn import_transactions_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let occurred_at = match parse_timestamp(record.get(0).unwrap_or("")) {
                Ok(ts) => ts,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: {}", e),
                    });
                    continue;
                }
            };

            let kind = match TransactionKind::from_str(record.get(1).unwrap_or("")) {
                Some(kind) => kind,
                None => {
                    errors.push(ImportError {
                        line,
                        field: Some("kind".to_string()),
                        error: "Kind must be 'income' or 'expense'".to_string(),
                    });
                    continue;
                }
            };

            let amount_cents = match parse_amount(record.get(2).unwrap_or("")) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let category = record.get(3).unwrap_or("").trim();
            if category.is_empty() {
                errors.push(ImportError {
                    line,
                    field: Some("category".to_string()),
                    error: "Category is required".to_string(),
                });
                continue;
            }

            let description = non_empty(record.get(4));

            if options.dry_run || options.validate_only {
                imported += 1;
                continue;
            }

            match self
                .service
                .record_transaction(
                    kind,
                    amount_cents,
                    category.to_string(),
                    occurred_at,
                    description,
                    None,
                    None,
                )
                .await
            {
                Ok(_) => imported += 1,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("Transaction creation failed: {}", e),
                    });
                }
            }
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.and_then(|s| {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    })
}

// Helper function to parse timestamp
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try YYYY-MM-DD format
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }

    anyhow::bail!("Invalid timestamp format: {}", s)
}
