mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{test_service, StandardStudio};
use studiolo::application::AppError;
use studiolo::domain::{
    MessageTrigger, DEFAULT_CONFIRMATION_BODY, DEFAULT_REMINDER_BODY, DEFAULT_WINBACK_BODY,
};

#[tokio::test]
async fn test_create_and_list_templates() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_template(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
            Some(24),
        )
        .await?;
    service
        .create_template(
            "volta-sempre".into(),
            MessageTrigger::Winback,
            DEFAULT_WINBACK_BODY.into(),
            None,
        )
        .await?;

    let templates = service.list_templates(false).await?;
    assert_eq!(templates.len(), 2);

    let result = service
        .create_template(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
            None,
        )
        .await;
    assert!(matches!(result, Err(AppError::TemplateAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_reminder_due_and_send_is_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .book_appointment(
            "Ana Souza",
            "corte".into(),
            Utc::now() + Duration::hours(20),
            60,
            Some("Carla"),
            None,
        )
        .await?;
    service
        .create_template(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
            Some(24),
        )
        .await?;

    let now = Utc::now();
    let due = service.due_reminders(now).await?;
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].template_name, "lembrete-24h");
    assert_eq!(due[0].client_name, "Ana Souza");
    assert!(due[0].body.contains("Ana Souza"));
    assert!(due[0].body.contains("Carla"));
    assert!(due[0].body.contains("Studio Aurora"));

    // Peeking logs nothing, so the reminder is still due
    assert_eq!(service.due_reminders(now).await?.len(), 1);

    let sent = service.send_due_reminders(now).await?;
    assert_eq!(sent.len(), 1);

    // Sending logged the appointment/template pair; nothing is due anymore
    assert!(service.due_reminders(now).await?.is_empty());
    assert!(service.send_due_reminders(now).await?.is_empty());
    assert_eq!(service.list_message_log().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_reminder_outside_lead_window_not_due() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .book_appointment(
            "Ana Souza",
            "corte".into(),
            Utc::now() + Duration::hours(72),
            60,
            None,
            None,
        )
        .await?;
    service
        .create_template(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
            Some(24),
        )
        .await?;

    assert!(service.due_reminders(Utc::now()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_deactivated_template_not_due() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .book_appointment(
            "Ana Souza",
            "corte".into(),
            Utc::now() + Duration::hours(20),
            60,
            None,
            None,
        )
        .await?;
    service
        .create_template(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
            Some(24),
        )
        .await?;
    service.deactivate_template("lembrete-24h").await?;

    assert!(service.due_reminders(Utc::now()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_winback_targets_at_risk_clients_once() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    // Ana visited 60 days ago; Bia never visited
    service
        .book_appointment(
            "Ana Souza",
            "corte".into(),
            Utc::now() - Duration::days(60),
            60,
            None,
            None,
        )
        .await?;
    service
        .create_template(
            "volta-sempre".into(),
            MessageTrigger::Winback,
            DEFAULT_WINBACK_BODY.into(),
            None,
        )
        .await?;

    let sent = service.send_winback(Utc::now(), 45).await?;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].client_name, "Ana Souza");
    assert!(sent[0].body.contains("Oi Ana Souza"));
    assert!(sent[0].body.contains("Studio Aurora"));

    // The log makes a re-run a no-op
    assert!(service.send_winback(Utc::now(), 45).await?.is_empty());
    assert_eq!(service.list_message_log().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_winback_without_template_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    let result = service.send_winback(Utc::now(), 45).await;
    assert!(matches!(result, Err(AppError::TemplateNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_confirmation_render() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStudio::create_basic(&service).await?;

    service
        .create_template(
            "confirmacao".into(),
            MessageTrigger::Confirmation,
            DEFAULT_CONFIRMATION_BODY.into(),
            None,
        )
        .await?;

    let booking = service
        .book_appointment(
            "Ana Souza",
            "coloracao".into(),
            Utc::now() + Duration::days(3),
            120,
            Some("Carla"),
            None,
        )
        .await?;

    let message = service.render_confirmation(booking.appointment.id).await?;
    assert_eq!(message.client_name, "Ana Souza");
    assert_eq!(message.whatsapp.as_deref(), Some("5511999990001"));
    assert!(message.body.contains("coloracao"));
    assert!(message.body.contains("Carla"));
    assert!(!message.body.contains('{'));

    // Rendering on demand never touches the log
    assert!(service.list_message_log().await?.is_empty());

    Ok(())
}
