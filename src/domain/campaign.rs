use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Appointment, AppointmentStatus, ClientId};

pub type MessageTemplateId = Uuid;
pub type MessageLogId = Uuid;

/// What causes a template to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTrigger {
    /// Sent right after booking
    Confirmation,
    /// Sent when the appointment is `hours_before` away
    Reminder,
    /// Sent to clients flagged by the churn heuristic
    Winback,
}

impl MessageTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageTrigger::Confirmation => "confirmation",
            MessageTrigger::Reminder => "reminder",
            MessageTrigger::Winback => "winback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "confirmation" => Some(MessageTrigger::Confirmation),
            "reminder" => Some(MessageTrigger::Reminder),
            "winback" => Some(MessageTrigger::Winback),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A WhatsApp message template. The body carries `{placeholder}` tokens that
/// `render` fills by literal substitution; unknown tokens stay verbatim (the
/// same silent posture as the contract merge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: MessageTemplateId,
    pub name: String,
    pub trigger: MessageTrigger,
    pub body: String,
    /// Reminder lead time; ignored for other triggers
    pub hours_before: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_REMINDER_BODY: &str = "Oi {cliente}! Passando para lembrar do seu horário de {servico} amanhã, dia {data} às {hora}, com {profissional}. Até lá! — {estudio}";

pub const DEFAULT_CONFIRMATION_BODY: &str = "Olá {cliente}, seu horário de {servico} está agendado para {data} às {hora} com {profissional}. Qualquer imprevisto é só avisar! — {estudio}";

pub const DEFAULT_WINBACK_BODY: &str =
    "Oi {cliente}, sentimos sua falta por aqui! Que tal agendar uma visita? — {estudio}";

impl MessageTemplate {
    pub fn new(name: String, trigger: MessageTrigger, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            trigger,
            body,
            hours_before: 24,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_hours_before(mut self, hours_before: i64) -> Self {
        assert!(hours_before > 0, "Reminder lead time must be positive");
        self.hours_before = hours_before;
        self
    }

    /// Fill the body's placeholders from the given values.
    pub fn render(&self, values: &MessageValues) -> String {
        self.body
            .replace("{cliente}", &values.client_name)
            .replace("{data}", &values.date)
            .replace("{hora}", &values.time)
            .replace("{servico}", &values.service)
            .replace("{profissional}", &values.professional)
            .replace("{estudio}", &values.studio)
    }
}

/// Placeholder values for rendering a template.
#[derive(Debug, Clone, Default)]
pub struct MessageValues {
    pub client_name: String,
    pub date: String,
    pub time: String,
    pub service: String,
    pub professional: String,
    pub studio: String,
}

impl MessageValues {
    /// Build values from an appointment. Date and time render the way the
    /// studio writes them on WhatsApp.
    pub fn for_appointment(
        appointment: &Appointment,
        professional_name: &str,
        studio: &str,
    ) -> Self {
        Self {
            client_name: appointment.client_name.clone(),
            date: appointment.scheduled_at.format("%d/%m/%Y").to_string(),
            time: appointment.scheduled_at.format("%H:%M").to_string(),
            service: appointment.service.clone(),
            professional: professional_name.to_string(),
            studio: studio.to_string(),
        }
    }
}

/// A rendered message that was surfaced to the operator. The log doubles as
/// the dedup key: a reminder is generated at most once per
/// appointment/template pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: MessageLogId,
    pub template_id: MessageTemplateId,
    pub client_id: ClientId,
    pub appointment_id: Option<super::AppointmentId>,
    pub body: String,
    pub logged_at: DateTime<Utc>,
}

impl MessageLogEntry {
    pub fn new(
        template_id: MessageTemplateId,
        client_id: ClientId,
        appointment_id: Option<super::AppointmentId>,
        body: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            client_id,
            appointment_id,
            body,
            logged_at: Utc::now(),
        }
    }
}

/// A reminder whose send window is open.
#[derive(Debug, Clone)]
pub struct DueReminder<'a> {
    pub template: &'a MessageTemplate,
    pub appointment: &'a Appointment,
}

/// Compute which reminders are due: active reminder templates crossed with
/// upcoming non-cancelled appointments inside the template's lead window,
/// minus pairs already in the log. Pure function of its inputs; re-running
/// it after logging yields nothing new.
pub fn due_reminders<'a>(
    templates: &'a [MessageTemplate],
    appointments: &'a [Appointment],
    log: &[MessageLogEntry],
    now: DateTime<Utc>,
) -> Vec<DueReminder<'a>> {
    let mut due = Vec::new();

    for template in templates
        .iter()
        .filter(|t| t.active && t.trigger == MessageTrigger::Reminder)
    {
        let window = Duration::hours(template.hours_before);
        for appointment in appointments {
            let upcoming = matches!(
                appointment.status,
                AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
            );
            if !upcoming {
                continue;
            }
            if appointment.scheduled_at <= now || appointment.scheduled_at - now > window {
                continue;
            }
            let already_logged = log.iter().any(|entry| {
                entry.template_id == template.id && entry.appointment_id == Some(appointment.id)
            });
            if already_logged {
                continue;
            }
            due.push(DueReminder {
                template,
                appointment,
            });
        }
    }

    due
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap()
    }

    fn appointment_at(hours_from_now: i64) -> Appointment {
        Appointment::new(
            Uuid::new_v4(),
            "Maria".into(),
            "corte".into(),
            now() + Duration::hours(hours_from_now),
            60,
        )
    }

    fn reminder_template() -> MessageTemplate {
        MessageTemplate::new(
            "lembrete-24h".into(),
            MessageTrigger::Reminder,
            DEFAULT_REMINDER_BODY.into(),
        )
        .with_hours_before(24)
    }

    #[test]
    fn test_render_fills_placeholders() {
        let template = reminder_template();
        let appointment = appointment_at(20);
        let values = MessageValues::for_appointment(&appointment, "Carla", "Studio Aurora");
        let message = template.render(&values);

        assert!(message.contains("Oi Maria!"));
        assert!(message.contains("15/03/2024"));
        assert!(message.contains("05:00"));
        assert!(message.contains("com Carla"));
        assert!(message.contains("Studio Aurora"));
        assert!(!message.contains('{'));
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let template = MessageTemplate::new(
            "custom".into(),
            MessageTrigger::Winback,
            "Oi {cliente}, use o cupom {cupom}!".into(),
        );
        let message = template.render(&MessageValues {
            client_name: "Bia".into(),
            ..Default::default()
        });
        assert_eq!(message, "Oi Bia, use o cupom {cupom}!");
    }

    #[test]
    fn test_due_inside_window() {
        let templates = vec![reminder_template()];
        let appointments = vec![appointment_at(20)];

        let due = due_reminders(&templates, &appointments, &[], now());
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_not_due_outside_window() {
        let templates = vec![reminder_template()];
        let appointments = vec![appointment_at(30)];

        let due = due_reminders(&templates, &appointments, &[], now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_past_appointment_not_due() {
        let templates = vec![reminder_template()];
        let appointments = vec![appointment_at(-2)];

        let due = due_reminders(&templates, &appointments, &[], now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_cancelled_appointment_not_due() {
        let templates = vec![reminder_template()];
        let mut appointment = appointment_at(20);
        appointment.status = AppointmentStatus::Cancelled;

        let appointments = [appointment];
        let due = due_reminders(&templates, &appointments, &[], now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_logged_pair_not_due_again() {
        let templates = vec![reminder_template()];
        let appointments = vec![appointment_at(20)];

        let entry = MessageLogEntry::new(
            templates[0].id,
            appointments[0].client_id,
            Some(appointments[0].id),
            "ja enviado".into(),
        );

        let due = due_reminders(&templates, &appointments, &[entry], now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_inactive_template_not_due() {
        let mut template = reminder_template();
        template.active = false;
        let appointments = vec![appointment_at(20)];

        let templates = [template];
        let due = due_reminders(&templates, &appointments, &[], now());
        assert!(due.is_empty());
    }

    #[test]
    fn test_trigger_roundtrip() {
        for trigger in [
            MessageTrigger::Confirmation,
            MessageTrigger::Reminder,
            MessageTrigger::Winback,
        ] {
            assert_eq!(MessageTrigger::from_str(trigger.as_str()), Some(trigger));
        }
    }
}
