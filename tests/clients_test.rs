mod common;

use anyhow::Result;
use common::{test_service, StandardStudio};
use studiolo::application::AppError;
use studiolo::domain::TransactionKind;
use studiolo::io::{Exporter, Importer, ImportOptions};

#[tokio::test]
async fn test_create_and_show_client() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let client = service.get_client("Ana Souza").await?;
    assert_eq!(client.whatsapp.as_deref(), Some("5511999990001"));
    assert_eq!(client.referral_source.as_deref(), Some("instagram"));
    assert!(!client.is_archived());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_client_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let result = service
        .create_client("Ana Souza".into(), None, None, None, None, None)
        .await;
    assert!(matches!(result, Err(AppError::ClientAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_client_keeps_unset_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let updated = service
        .update_client(
            "Ana Souza",
            Some("5511888880000".into()),
            None,
            None,
            None,
            None,
        )
        .await?;

    assert_eq!(updated.whatsapp.as_deref(), Some("5511888880000"));
    // Unset fields survive the update
    assert_eq!(updated.document.as_deref(), Some("123.456.789-09"));

    Ok(())
}

#[tokio::test]
async fn test_archive_client() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service.archive_client("Bia Lima").await?;

    let active = service.list_clients(false).await?;
    assert_eq!(active.len(), 1);

    let all = service.list_clients(true).await?;
    assert_eq!(all.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_client_profile_totals() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .record_transaction(
            TransactionKind::Income,
            15000,
            "comanda".into(),
            common::parse_date("2024-02-01"),
            None,
            Some("Ana Souza"),
            Some("pix"),
        )
        .await?;
    service
        .record_transaction(
            TransactionKind::Income,
            8000,
            "comanda".into(),
            common::parse_date("2024-03-01"),
            None,
            Some("Ana Souza"),
            None,
        )
        .await?;
    // Expense linked to the client must not count toward total spent
    service
        .record_transaction(
            TransactionKind::Expense,
            5000,
            "insumos".into(),
            common::parse_date("2024-03-02"),
            None,
            None,
            None,
        )
        .await?;

    let profile = service.get_client_profile("Ana Souza").await?;
    assert_eq!(profile.total_spent, 23000);
    assert_eq!(profile.appointment_count, 0);
    assert!(profile.last_appointment.is_none());

    Ok(())
}

#[tokio::test]
async fn test_import_clients_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let csv = "\
name,whatsapp,document,referral_source
Clara Nunes,5511977770000,,indicacao
Ana Souza,,,instagram
,555,,
Duda Reis,,,";

    let importer = Importer::new(&service);
    let result = importer
        .import_clients_csv(
            csv.as_bytes(),
            ImportOptions {
                skip_duplicates: true,
                ..Default::default()
            },
        )
        .await?;

    // Clara and Duda imported; Ana skipped as duplicate; empty name errored
    assert_eq!(result.imported, 2);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field.as_deref(), Some("name"));

    let clara = service.get_client("Clara Nunes").await?;
    assert_eq!(clara.whatsapp.as_deref(), Some("5511977770000"));
    assert_eq!(clara.referral_source.as_deref(), Some("indicacao"));

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let csv = "name,whatsapp,document,referral_source\nClara Nunes,,,\n";
    let importer = Importer::new(&service);
    let result = importer
        .import_clients_csv(
            csv.as_bytes(),
            ImportOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(result.imported, 1);
    assert!(service.list_clients(true).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_export_clients_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let count = exporter.export_clients_csv(&mut buffer).await?;

    assert_eq!(count, 2);
    let output = String::from_utf8(buffer)?;
    assert!(output.starts_with("id,name,whatsapp"));
    assert!(output.contains("Ana Souza"));
    assert!(output.contains("Bia Lima"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let snapshot = exporter.export_full_json(&mut buffer).await?;

    assert_eq!(snapshot.clients.len(), 2);
    assert_eq!(snapshot.professionals.len(), 1);
    assert_eq!(snapshot.payment_methods.len(), 2);

    // The written JSON parses back
    let parsed: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed["clients"].as_array().unwrap().len(), 2);

    Ok(())
}
