use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::StudioService;
use crate::domain::{
    Appointment, Client, MessageTemplate, PaymentMethod, Product, Professional, Transaction,
};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub clients: Vec<Client>,
    pub professionals: Vec<Professional>,
    pub payment_methods: Vec<PaymentMethod>,
    pub products: Vec<Product>,
    pub appointments: Vec<Appointment>,
    pub transactions: Vec<Transaction>,
    pub message_templates: Vec<MessageTemplate>,
}

/// Exporter for converting studio data to tabular formats
pub struct Exporter<'a> {
    service: &'a StudioService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a StudioService) -> Self {
        Self { service }
    }

    /// Export clients to CSV format
    pub async fn export_clients_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let clients = self.service.list_clients(true).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "whatsapp",
            "document",
            "address",
            "referral_source",
            "created_at",
            "archived_at",
        ])?;

        let mut count = 0;
        for client in &clients {
            csv_writer.write_record([
                client.id.to_string(),
                client.name.clone(),
                client.whatsapp.clone().unwrap_or_default(),
                client.document.clone().unwrap_or_default(),
                client.address.clone().unwrap_or_default(),
                client.referral_source.clone().unwrap_or_default(),
                client.created_at.to_rfc3339(),
                client
                    .archived_at
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export transactions to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_all_transactions().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "occurred_at",
            "kind",
            "amount_cents",
            "category",
            "description",
            "client_id",
            "payment_method_id",
            "status",
        ])?;

        let mut count = 0;
        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.occurred_at.to_rfc3339(),
                tx.kind.as_str().to_string(),
                tx.amount_cents.to_string(),
                tx.category.clone(),
                tx.description.clone().unwrap_or_default(),
                tx.client_id.map(|id| id.to_string()).unwrap_or_default(),
                tx.payment_method_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                tx.status.as_str().to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export appointments to CSV format
    pub async fn export_appointments_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let appointments = self.service.list_all_appointments().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "client_name",
            "service",
            "scheduled_at",
            "duration_min",
            "status",
            "notes",
        ])?;

        let mut count = 0;
        for appointment in &appointments {
            csv_writer.write_record([
                appointment.id.to_string(),
                appointment.client_name.clone(),
                appointment.service.clone(),
                appointment.scheduled_at.to_rfc3339(),
                appointment.duration_min.to_string(),
                appointment.status.as_str().to_string(),
                appointment.notes.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full database as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            clients: self.service.list_clients(true).await?,
            professionals: self.service.list_professionals(true).await?,
            payment_methods: self.service.list_payment_methods(true).await?,
            products: self.service.list_products().await?,
            appointments: self.service.list_all_appointments().await?,
            transactions: self.service.list_all_transactions().await?,
            message_templates: self.service.list_templates(true).await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
