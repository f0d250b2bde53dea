use thiserror::Error;

use crate::domain::{AppointmentStatus, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Client already exists: {0}")]
    ClientAlreadyExists(String),

    #[error("Client is archived: {0}")]
    ClientArchived(String),

    #[error("Professional not found: {0}")]
    ProfessionalNotFound(String),

    #[error("Professional already exists: {0}")]
    ProfessionalAlreadyExists(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Cannot change appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(String),

    #[error("Payment method already exists: {0}")]
    PaymentMethodAlreadyExists(String),

    #[error("Payment method is inactive: {0}")]
    PaymentMethodInactive(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product already exists: {0}")]
    ProductAlreadyExists(String),

    #[error("Insufficient stock of {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("Comanda not found: {0}")]
    CommandNotFound(String),

    #[error("Comanda is not open: {0}")]
    CommandNotOpen(String),

    #[error("Client already has an open comanda: {0}")]
    CommandAlreadyOpen(String),

    #[error("Comanda has no items: {0}")]
    CommandEmpty(String),

    #[error("Payments of {tendered} do not match comanda total of {total}")]
    PaymentMismatch { total: Cents, tendered: Cents },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Anamnesis form not found for client: {0}")]
    AnamnesisNotFound(String),

    #[error("Cannot sign anamnesis without consent")]
    ConsentRequired,

    #[error("Message template not found: {0}")]
    TemplateNotFound(String),

    #[error("Message template already exists: {0}")]
    TemplateAlreadyExists(String),

    #[error("Invalid trigger: {0} (valid: confirmation, reminder, winback)")]
    InvalidTrigger(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
