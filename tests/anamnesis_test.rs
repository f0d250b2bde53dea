mod common;

use anyhow::Result;
use common::{test_service, StandardStudio};
use studiolo::application::AppError;
use studiolo::domain::{AnamnesisAnswer, STANDARD_QUESTIONS};

fn sample_answers() -> Vec<AnamnesisAnswer> {
    vec![
        AnamnesisAnswer {
            question: STANDARD_QUESTIONS[0].to_string(),
            answer: "Não".into(),
            contraindication: false,
        },
        AnamnesisAnswer {
            question: STANDARD_QUESTIONS[1].to_string(),
            answer: "Sim, gestante de 5 meses".into(),
            contraindication: true,
        },
    ]
}

#[tokio::test]
async fn test_record_unsigned_form() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let form = service
        .record_anamnesis("Ana Souza", sample_answers(), false, false)
        .await?;

    assert_eq!(form.answers.len(), 2);
    assert!(!form.consent);
    assert!(!form.is_signed());

    Ok(())
}

#[tokio::test]
async fn test_sign_requires_consent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let result = service
        .record_anamnesis("Ana Souza", sample_answers(), false, true)
        .await;
    assert!(matches!(result, Err(AppError::ConsentRequired)));

    // Nothing was persisted
    let result = service.latest_anamnesis("Ana Souza").await;
    assert!(matches!(result, Err(AppError::AnamnesisNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_record_signed_form() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let form = service
        .record_anamnesis("Ana Souza", sample_answers(), true, true)
        .await?;

    assert!(form.consent);
    assert!(form.is_signed());
    assert!(form.signed_at.is_some());

    let fetched = service.latest_anamnesis("Ana Souza").await?;
    assert_eq!(fetched.id, form.id);
    assert_eq!(fetched.answers.len(), 2);
    assert!(fetched.is_signed());

    Ok(())
}

#[tokio::test]
async fn test_contraindications_survive_roundtrip() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .record_anamnesis("Ana Souza", sample_answers(), true, true)
        .await?;

    let form = service.latest_anamnesis("Ana Souza").await?;
    let flagged = form.contraindications();
    assert_eq!(flagged.len(), 1);
    assert!(flagged[0].answer.contains("gestante"));

    Ok(())
}

#[tokio::test]
async fn test_history_newest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .record_anamnesis("Ana Souza", sample_answers(), true, true)
        .await?;

    let mut updated = sample_answers();
    updated.push(AnamnesisAnswer {
        question: "Usa lentes de contato?".into(),
        answer: "Sim".into(),
        contraindication: false,
    });
    service
        .record_anamnesis("Ana Souza", updated, true, true)
        .await?;

    let history = service.list_anamnesis("Ana Souza").await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].answers.len(), 3);
    assert_eq!(history[1].answers.len(), 2);

    let latest = service.latest_anamnesis("Ana Souza").await?;
    assert_eq!(latest.answers.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_record_for_unknown_client_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let result = service
        .record_anamnesis("Ninguem", sample_answers(), true, true)
        .await;
    assert!(matches!(result, Err(AppError::ClientNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_forms_are_per_client() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .record_anamnesis("Ana Souza", sample_answers(), true, true)
        .await?;

    let result = service.latest_anamnesis("Bia Lima").await;
    assert!(matches!(result, Err(AppError::AnamnesisNotFound(_))));
    assert!(service.list_anamnesis("Bia Lima").await?.is_empty());

    Ok(())
}
