// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use studiolo::application::StudioService;
use studiolo::domain::PaymentKind;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(StudioService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = StudioService::init(db_path.to_str().unwrap(), Some("Studio Aurora")).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: standard studio setup
pub struct StandardStudio;

impl StandardStudio {
    /// Create a basic setup: two clients, one professional, two payment
    /// methods
    pub async fn create_basic(service: &StudioService) -> Result<()> {
        service
            .create_client(
                "Ana Souza".into(),
                Some("5511999990001".into()),
                Some("123.456.789-09".into()),
                Some("Rua das Flores, 10".into()),
                Some("instagram".into()),
                None,
            )
            .await?;
        service
            .create_client("Bia Lima".into(), None, None, None, None, None)
            .await?;
        service
            .create_professional("Carla".into(), "cabeleireira".into(), 4000)
            .await?;
        service
            .create_payment_method("pix".into(), PaymentKind::Pix, 0, 1)
            .await?;
        service
            .create_payment_method("credito".into(), PaymentKind::Credit, 349, 12)
            .await?;
        Ok(())
    }

    /// Basic setup plus a couple of stocked products
    pub async fn create_with_products(service: &StudioService) -> Result<()> {
        Self::create_basic(service).await?;
        service
            .create_product("Shampoo Reparador".into(), 5, 1500, 4500, 2)
            .await?;
        service
            .create_product("Pomada Modeladora".into(), 2, 2200, 5900, 3)
            .await?;
        Ok(())
    }
}
