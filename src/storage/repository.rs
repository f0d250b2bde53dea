use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    AnamnesisForm, Appointment, AppointmentId, AppointmentStatus, Cents, Client, ClientId,
    Command, CommandId, CommandItem, CommandItemKind, CommandStatus, MessageLogEntry,
    MessageTemplate, MessageTrigger, PaymentKind, PaymentMethod, PaymentMethodId, Product,
    ProductId, Professional, ProfessionalId, Transaction, TransactionKind, TransactionStatus,
};

use super::{
    MIGRATION_001_INITIAL, MIGRATION_002_ANAMNESIS, MIGRATION_003_COMMANDS, MIGRATION_004_CAMPAIGNS,
};

/// Repository for persisting and querying studio records.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_ANAMNESIS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        sqlx::query(MIGRATION_003_COMMANDS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 003")?;

        sqlx::query(MIGRATION_004_CAMPAIGNS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 004")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Settings
    // ========================

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("Failed to save setting")?;
        Ok(())
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch setting")?;
        Ok(row.map(|r| r.get("value")))
    }

    // ========================
    // Client operations
    // ========================

    /// Save a new client to the database.
    pub async fn save_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, whatsapp, document, address, referral_source, notes, created_at, archived_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(client.id.to_string())
        .bind(&client.name)
        .bind(&client.whatsapp)
        .bind(&client.document)
        .bind(&client.address)
        .bind(&client.referral_source)
        .bind(&client.notes)
        .bind(client.created_at.to_rfc3339())
        .bind(client.archived_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save client")?;
        Ok(())
    }

    /// Update a client's mutable fields.
    pub async fn update_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE clients
            SET whatsapp = ?, document = ?, address = ?, referral_source = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&client.whatsapp)
        .bind(&client.document)
        .bind(&client.address)
        .bind(&client.referral_source)
        .bind(&client.notes)
        .bind(client.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update client")?;
        Ok(())
    }

    /// Get a client by ID.
    pub async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, whatsapp, document, address, referral_source, notes, created_at, archived_at
            FROM clients
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_client(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a client by name.
    pub async fn get_client_by_name(&self, name: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, whatsapp, document, address, referral_source, notes, created_at, archived_at
            FROM clients
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_client(&row)?)),
            None => Ok(None),
        }
    }

    /// List all clients (optionally including archived).
    pub async fn list_clients(&self, include_archived: bool) -> Result<Vec<Client>> {
        let query = if include_archived {
            "SELECT id, name, whatsapp, document, address, referral_source, notes, created_at, archived_at FROM clients ORDER BY name"
        } else {
            "SELECT id, name, whatsapp, document, address, referral_source, notes, created_at, archived_at FROM clients WHERE archived_at IS NULL ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list clients")?;

        rows.iter().map(Self::row_to_client).collect()
    }

    /// Archive a client (soft delete).
    pub async fn archive_client(&self, id: ClientId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE clients SET archived_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to archive client")?;
        Ok(())
    }

    /// Lifetime income attributed to a client, via SQL aggregation.
    pub async fn sum_income_for_client(&self, id: ClientId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM transactions
            WHERE client_id = ? AND kind = 'income'
            "#,
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum client income")?;

        Ok(row.get("total"))
    }

    /// Count appointments for a client.
    pub async fn count_appointments_for_client(&self, id: ClientId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM appointments WHERE client_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count appointments")?;
        Ok(row.get("count"))
    }

    /// Most recent appointment date for a client.
    pub async fn last_appointment_date(&self, id: ClientId) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MAX(scheduled_at) as last FROM appointments WHERE client_id = ?",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to get last appointment date")?;

        let last: Option<String> = row.get("last");
        match last {
            Some(s) => Ok(Some(
                DateTime::parse_from_rfc3339(&s)
                    .context("Invalid timestamp")?
                    .with_timezone(&Utc),
            )),
            None => Ok(None),
        }
    }

    fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");
        let archived_at_str: Option<String> = row.get("archived_at");

        Ok(Client {
            id: Uuid::parse_str(&id_str).context("Invalid client ID")?,
            name: row.get("name"),
            whatsapp: row.get("whatsapp"),
            document: row.get("document"),
            address: row.get("address"),
            referral_source: row.get("referral_source"),
            notes: row.get("notes"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            archived_at: archived_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid archived_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    // ========================
    // Professional operations
    // ========================

    /// Save a new professional.
    pub async fn save_professional(&self, professional: &Professional) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO professionals (id, name, role, commission_bps, created_at, archived_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(professional.id.to_string())
        .bind(&professional.name)
        .bind(&professional.role)
        .bind(professional.commission_bps)
        .bind(professional.created_at.to_rfc3339())
        .bind(professional.archived_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save professional")?;
        Ok(())
    }

    /// Get a professional by ID.
    pub async fn get_professional(&self, id: ProfessionalId) -> Result<Option<Professional>> {
        let row = sqlx::query(
            "SELECT id, name, role, commission_bps, created_at, archived_at FROM professionals WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch professional")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_professional(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a professional by name.
    pub async fn get_professional_by_name(&self, name: &str) -> Result<Option<Professional>> {
        let row = sqlx::query(
            "SELECT id, name, role, commission_bps, created_at, archived_at FROM professionals WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch professional by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_professional(&row)?)),
            None => Ok(None),
        }
    }

    /// List professionals (optionally including archived).
    pub async fn list_professionals(&self, include_archived: bool) -> Result<Vec<Professional>> {
        let query = if include_archived {
            "SELECT id, name, role, commission_bps, created_at, archived_at FROM professionals ORDER BY name"
        } else {
            "SELECT id, name, role, commission_bps, created_at, archived_at FROM professionals WHERE archived_at IS NULL ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list professionals")?;

        rows.iter().map(Self::row_to_professional).collect()
    }

    /// Archive a professional.
    pub async fn archive_professional(&self, id: ProfessionalId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE professionals SET archived_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to archive professional")?;
        Ok(())
    }

    fn row_to_professional(row: &sqlx::sqlite::SqliteRow) -> Result<Professional> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");
        let archived_at_str: Option<String> = row.get("archived_at");

        Ok(Professional {
            id: Uuid::parse_str(&id_str).context("Invalid professional ID")?,
            name: row.get("name"),
            role: row.get("role"),
            commission_bps: row.get("commission_bps"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            archived_at: archived_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid archived_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    // ========================
    // Payment method operations
    // ========================

    /// Save a new payment method.
    pub async fn save_payment_method(&self, method: &PaymentMethod) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_methods (id, name, kind, fee_bps, max_installments, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(method.id.to_string())
        .bind(&method.name)
        .bind(method.kind.as_str())
        .bind(method.fee_bps)
        .bind(method.max_installments)
        .bind(method.active)
        .bind(method.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save payment method")?;
        Ok(())
    }

    /// Get a payment method by ID.
    pub async fn get_payment_method(&self, id: PaymentMethodId) -> Result<Option<PaymentMethod>> {
        let row = sqlx::query(
            "SELECT id, name, kind, fee_bps, max_installments, active, created_at FROM payment_methods WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment method")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payment_method(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a payment method by name.
    pub async fn get_payment_method_by_name(&self, name: &str) -> Result<Option<PaymentMethod>> {
        let row = sqlx::query(
            "SELECT id, name, kind, fee_bps, max_installments, active, created_at FROM payment_methods WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment method by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payment_method(&row)?)),
            None => Ok(None),
        }
    }

    /// List payment methods (optionally including inactive).
    pub async fn list_payment_methods(&self, include_inactive: bool) -> Result<Vec<PaymentMethod>> {
        let query = if include_inactive {
            "SELECT id, name, kind, fee_bps, max_installments, active, created_at FROM payment_methods ORDER BY name"
        } else {
            "SELECT id, name, kind, fee_bps, max_installments, active, created_at FROM payment_methods WHERE active = 1 ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list payment methods")?;

        rows.iter().map(Self::row_to_payment_method).collect()
    }

    /// Deactivate a payment method.
    pub async fn deactivate_payment_method(&self, id: PaymentMethodId) -> Result<()> {
        sqlx::query("UPDATE payment_methods SET active = 0 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to deactivate payment method")?;
        Ok(())
    }

    fn row_to_payment_method(row: &sqlx::sqlite::SqliteRow) -> Result<PaymentMethod> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(PaymentMethod {
            id: Uuid::parse_str(&id_str).context("Invalid payment method ID")?,
            name: row.get("name"),
            kind: PaymentKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment kind: {}", kind_str))?,
            fee_bps: row.get("fee_bps"),
            max_installments: row.get("max_installments"),
            active: row.get::<i32, _>("active") != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Product operations
    // ========================

    /// Save a new product.
    pub async fn save_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, stock_quantity, cost_price_cents, sale_price_cents, min_stock, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.stock_quantity)
        .bind(product.cost_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_stock)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save product")?;
        Ok(())
    }

    /// Get a product by ID.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, stock_quantity, cost_price_cents, sale_price_cents, min_stock, created_at FROM products WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a product by name.
    pub async fn get_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, stock_quantity, cost_price_cents, sale_price_cents, min_stock, created_at FROM products WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    /// List all products.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, stock_quantity, cost_price_cents, sale_price_cents, min_stock, created_at FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?;

        rows.iter().map(Self::row_to_product).collect()
    }

    /// Set a product's stock to an absolute quantity.
    pub async fn set_stock(&self, id: ProductId, quantity: i64) -> Result<()> {
        sqlx::query("UPDATE products SET stock_quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to set stock")?;
        Ok(())
    }

    /// Take stock for a sale. Returns false when there isn't enough left,
    /// without changing anything.
    pub async fn take_stock(&self, id: ProductId, quantity: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?
            WHERE id = ? AND stock_quantity >= ?
            "#,
        )
        .bind(quantity)
        .bind(id.to_string())
        .bind(quantity)
        .execute(&self.pool)
        .await
        .context("Failed to take stock")?;

        Ok(result.rows_affected() == 1)
    }

    fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Product {
            id: Uuid::parse_str(&id_str).context("Invalid product ID")?,
            name: row.get("name"),
            stock_quantity: row.get("stock_quantity"),
            cost_price_cents: row.get("cost_price_cents"),
            sale_price_cents: row.get("sale_price_cents"),
            min_stock: row.get("min_stock"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Appointment operations
    // ========================

    /// Save a new appointment.
    pub async fn save_appointment(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(appointment.id.to_string())
        .bind(appointment.client_id.to_string())
        .bind(&appointment.client_name)
        .bind(appointment.professional_id.map(|id| id.to_string()))
        .bind(&appointment.service)
        .bind(appointment.scheduled_at.to_rfc3339())
        .bind(appointment.duration_min)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(appointment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save appointment")?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let row = sqlx::query(
            r#"
            SELECT id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at
            FROM appointments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch appointment")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_appointment(&row)?)),
            None => Ok(None),
        }
    }

    /// Update an appointment's status.
    pub async fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE appointments SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update appointment status")?;
        Ok(())
    }

    /// List every appointment, ordered by scheduled time.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at
            FROM appointments
            ORDER BY scheduled_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list appointments")?;

        rows.iter().map(Self::row_to_appointment).collect()
    }

    /// Appointments scheduled within [from, to).
    pub async fn list_appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at
            FROM appointments
            WHERE scheduled_at >= ? AND scheduled_at < ?
            ORDER BY scheduled_at
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list appointments in range")?;

        rows.iter().map(Self::row_to_appointment).collect()
    }

    /// A client's appointments, oldest first.
    pub async fn list_appointments_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at
            FROM appointments
            WHERE client_id = ?
            ORDER BY scheduled_at
            "#,
        )
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list appointments for client")?;

        rows.iter().map(Self::row_to_appointment).collect()
    }

    /// Upcoming appointments that can still happen (agendado/confirmado).
    pub async fn list_upcoming_appointments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, client_name, professional_id, service, scheduled_at, duration_min, status, notes, created_at
            FROM appointments
            WHERE scheduled_at > ? AND status IN ('agendado', 'confirmado')
            ORDER BY scheduled_at
            "#,
        )
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list upcoming appointments")?;

        rows.iter().map(Self::row_to_appointment).collect()
    }

    fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment> {
        let id_str: String = row.get("id");
        let client_id_str: String = row.get("client_id");
        let professional_id_str: Option<String> = row.get("professional_id");
        let scheduled_at_str: String = row.get("scheduled_at");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Appointment {
            id: Uuid::parse_str(&id_str).context("Invalid appointment ID")?,
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            client_name: row.get("client_name"),
            professional_id: professional_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid professional ID")?,
            service: row.get("service"),
            scheduled_at: DateTime::parse_from_rfc3339(&scheduled_at_str)
                .context("Invalid scheduled_at timestamp")?
                .with_timezone(&Utc),
            duration_min: row.get("duration_min"),
            status: AppointmentStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid appointment status: {}", status_str))?,
            notes: row.get("notes"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Save a new transaction.
    pub async fn save_transaction(&self, tx: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, occurred_at, recorded_at, kind, amount_cents, category, description, client_id, payment_method_id, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.id.to_string())
        .bind(tx.occurred_at.to_rfc3339())
        .bind(tx.recorded_at.to_rfc3339())
        .bind(tx.kind.as_str())
        .bind(tx.amount_cents)
        .bind(&tx.category)
        .bind(&tx.description)
        .bind(tx.client_id.map(|id| id.to_string()))
        .bind(tx.payment_method_id.map(|id| id.to_string()))
        .bind(tx.status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(())
    }

    /// Every transaction, oldest first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, occurred_at, recorded_at, kind, amount_cents, category, description, client_id, payment_method_id, status
            FROM transactions
            ORDER BY occurred_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Transactions that occurred within [from, to).
    pub async fn list_transactions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, occurred_at, recorded_at, kind, amount_cents, category, description, client_id, payment_method_id, status
            FROM transactions
            WHERE occurred_at >= ? AND occurred_at < ?
            ORDER BY occurred_at
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions in range")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let occurred_at_str: String = row.get("occurred_at");
        let recorded_at_str: String = row.get("recorded_at");
        let kind_str: String = row.get("kind");
        let client_id_str: Option<String> = row.get("client_id");
        let payment_method_id_str: Option<String> = row.get("payment_method_id");
        let status_str: String = row.get("status");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            occurred_at: DateTime::parse_from_rfc3339(&occurred_at_str)
                .context("Invalid occurred_at timestamp")?
                .with_timezone(&Utc),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            category: row.get("category"),
            description: row.get("description"),
            client_id: client_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid client ID")?,
            payment_method_id: payment_method_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid payment method ID")?,
            status: TransactionStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction status: {}", status_str))?,
        })
    }

    // ========================
    // Anamnesis operations
    // ========================

    /// Save a new anamnesis form. Answers are stored as a JSON column.
    pub async fn save_anamnesis(&self, form: &AnamnesisForm) -> Result<()> {
        let answers_json = serde_json::to_string(&form.answers)?;

        sqlx::query(
            r#"
            INSERT INTO anamnesis_forms (id, client_id, answers, consent, signed_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(form.id.to_string())
        .bind(form.client_id.to_string())
        .bind(&answers_json)
        .bind(form.consent)
        .bind(form.signed_at.map(|dt| dt.to_rfc3339()))
        .bind(form.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save anamnesis form")?;
        Ok(())
    }

    /// A client's forms, newest first.
    pub async fn list_anamnesis_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<AnamnesisForm>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, answers, consent, signed_at, created_at
            FROM anamnesis_forms
            WHERE client_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list anamnesis forms")?;

        rows.iter().map(Self::row_to_anamnesis).collect()
    }

    /// The most recent form for a client, if any.
    pub async fn latest_anamnesis_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Option<AnamnesisForm>> {
        let row = sqlx::query(
            r#"
            SELECT id, client_id, answers, consent, signed_at, created_at
            FROM anamnesis_forms
            WHERE client_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest anamnesis form")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_anamnesis(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_anamnesis(row: &sqlx::sqlite::SqliteRow) -> Result<AnamnesisForm> {
        let id_str: String = row.get("id");
        let client_id_str: String = row.get("client_id");
        let answers_json: String = row.get("answers");
        let signed_at_str: Option<String> = row.get("signed_at");
        let created_at_str: String = row.get("created_at");

        Ok(AnamnesisForm {
            id: Uuid::parse_str(&id_str).context("Invalid anamnesis ID")?,
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            answers: serde_json::from_str(&answers_json).context("Invalid answers JSON")?,
            consent: row.get::<i32, _>("consent") != 0,
            signed_at: signed_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid signed_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Comanda operations
    // ========================

    /// Save a new comanda.
    pub async fn save_command(&self, command: &Command) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO commands (id, client_id, status, opened_at, closed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(command.id.to_string())
        .bind(command.client_id.to_string())
        .bind(command.status.as_str())
        .bind(command.opened_at.to_rfc3339())
        .bind(command.closed_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save comanda")?;
        Ok(())
    }

    /// Get a comanda by ID.
    pub async fn get_command(&self, id: CommandId) -> Result<Option<Command>> {
        let row = sqlx::query(
            "SELECT id, client_id, status, opened_at, closed_at FROM commands WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch comanda")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_command(&row)?)),
            None => Ok(None),
        }
    }

    /// The open comanda for a client, if any.
    pub async fn open_command_for_client(&self, client_id: ClientId) -> Result<Option<Command>> {
        let row = sqlx::query(
            "SELECT id, client_id, status, opened_at, closed_at FROM commands WHERE client_id = ? AND status = 'open'",
        )
        .bind(client_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch open comanda")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_command(&row)?)),
            None => Ok(None),
        }
    }

    /// Mark a comanda closed.
    pub async fn close_command(&self, id: CommandId, closed_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE commands SET status = 'closed', closed_at = ? WHERE id = ?")
            .bind(closed_at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to close comanda")?;
        Ok(())
    }

    /// Mark a comanda cancelled.
    pub async fn cancel_command(&self, id: CommandId) -> Result<()> {
        sqlx::query("UPDATE commands SET status = 'cancelled' WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to cancel comanda")?;
        Ok(())
    }

    /// Save a line item.
    pub async fn save_command_item(&self, item: &CommandItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO command_items (id, command_id, kind, description, professional_id, product_id, quantity, unit_price_cents)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.command_id.to_string())
        .bind(item.kind.as_str())
        .bind(&item.description)
        .bind(item.professional_id.map(|id| id.to_string()))
        .bind(item.product_id.map(|id| id.to_string()))
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .execute(&self.pool)
        .await
        .context("Failed to save comanda item")?;
        Ok(())
    }

    /// Line items of a comanda, in insertion order.
    pub async fn list_command_items(&self, command_id: CommandId) -> Result<Vec<CommandItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, command_id, kind, description, professional_id, product_id, quantity, unit_price_cents
            FROM command_items
            WHERE command_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(command_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comanda items")?;

        rows.iter().map(Self::row_to_command_item).collect()
    }

    fn row_to_command(row: &sqlx::sqlite::SqliteRow) -> Result<Command> {
        let id_str: String = row.get("id");
        let client_id_str: String = row.get("client_id");
        let status_str: String = row.get("status");
        let opened_at_str: String = row.get("opened_at");
        let closed_at_str: Option<String> = row.get("closed_at");

        Ok(Command {
            id: Uuid::parse_str(&id_str).context("Invalid comanda ID")?,
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            status: CommandStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid comanda status: {}", status_str))?,
            opened_at: DateTime::parse_from_rfc3339(&opened_at_str)
                .context("Invalid opened_at timestamp")?
                .with_timezone(&Utc),
            closed_at: closed_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid closed_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    fn row_to_command_item(row: &sqlx::sqlite::SqliteRow) -> Result<CommandItem> {
        let id_str: String = row.get("id");
        let command_id_str: String = row.get("command_id");
        let kind_str: String = row.get("kind");
        let professional_id_str: Option<String> = row.get("professional_id");
        let product_id_str: Option<String> = row.get("product_id");

        Ok(CommandItem {
            id: Uuid::parse_str(&id_str).context("Invalid item ID")?,
            command_id: Uuid::parse_str(&command_id_str).context("Invalid comanda ID")?,
            kind: CommandItemKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid item kind: {}", kind_str))?,
            description: row.get("description"),
            professional_id: professional_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid professional ID")?,
            product_id: product_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid product ID")?,
            quantity: row.get("quantity"),
            unit_price_cents: row.get("unit_price_cents"),
        })
    }

    // ========================
    // Campaign operations
    // ========================

    /// Save a new message template.
    pub async fn save_template(&self, template: &MessageTemplate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_templates (id, name, trigger_kind, body, hours_before, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(template.id.to_string())
        .bind(&template.name)
        .bind(template.trigger.as_str())
        .bind(&template.body)
        .bind(template.hours_before)
        .bind(template.active)
        .bind(template.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save message template")?;
        Ok(())
    }

    /// Get a template by name.
    pub async fn get_template_by_name(&self, name: &str) -> Result<Option<MessageTemplate>> {
        let row = sqlx::query(
            "SELECT id, name, trigger_kind, body, hours_before, active, created_at FROM message_templates WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch message template")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_template(&row)?)),
            None => Ok(None),
        }
    }

    /// List templates (optionally including inactive).
    pub async fn list_templates(&self, include_inactive: bool) -> Result<Vec<MessageTemplate>> {
        let query = if include_inactive {
            "SELECT id, name, trigger_kind, body, hours_before, active, created_at FROM message_templates ORDER BY name"
        } else {
            "SELECT id, name, trigger_kind, body, hours_before, active, created_at FROM message_templates WHERE active = 1 ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list message templates")?;

        rows.iter().map(Self::row_to_template).collect()
    }

    /// The oldest active template for a trigger, if any.
    pub async fn first_active_template(
        &self,
        trigger: MessageTrigger,
    ) -> Result<Option<MessageTemplate>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, trigger_kind, body, hours_before, active, created_at
            FROM message_templates
            WHERE trigger_kind = ? AND active = 1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(trigger.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch template for trigger")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_template(&row)?)),
            None => Ok(None),
        }
    }

    /// Deactivate a template.
    pub async fn deactivate_template(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE message_templates SET active = 0 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to deactivate template")?;
        Ok(())
    }

    /// Append to the message log.
    pub async fn save_message_log(&self, entry: &MessageLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_log (id, template_id, client_id, appointment_id, body, logged_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.template_id.to_string())
        .bind(entry.client_id.to_string())
        .bind(entry.appointment_id.map(|id| id.to_string()))
        .bind(&entry.body)
        .bind(entry.logged_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save message log entry")?;
        Ok(())
    }

    /// The whole message log.
    pub async fn list_message_log(&self) -> Result<Vec<MessageLogEntry>> {
        let rows = sqlx::query(
            "SELECT id, template_id, client_id, appointment_id, body, logged_at FROM message_log ORDER BY logged_at",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list message log")?;

        rows.iter().map(Self::row_to_log_entry).collect()
    }

    fn row_to_template(row: &sqlx::sqlite::SqliteRow) -> Result<MessageTemplate> {
        let id_str: String = row.get("id");
        let trigger_str: String = row.get("trigger_kind");
        let created_at_str: String = row.get("created_at");

        Ok(MessageTemplate {
            id: Uuid::parse_str(&id_str).context("Invalid template ID")?,
            name: row.get("name"),
            trigger: MessageTrigger::from_str(&trigger_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid trigger: {}", trigger_str))?,
            body: row.get("body"),
            hours_before: row.get("hours_before"),
            active: row.get::<i32, _>("active") != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_log_entry(row: &sqlx::sqlite::SqliteRow) -> Result<MessageLogEntry> {
        let id_str: String = row.get("id");
        let template_id_str: String = row.get("template_id");
        let client_id_str: String = row.get("client_id");
        let appointment_id_str: Option<String> = row.get("appointment_id");
        let logged_at_str: String = row.get("logged_at");

        Ok(MessageLogEntry {
            id: Uuid::parse_str(&id_str).context("Invalid log ID")?,
            template_id: Uuid::parse_str(&template_id_str).context("Invalid template ID")?,
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            appointment_id: appointment_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid appointment ID")?,
            body: row.get("body"),
            logged_at: DateTime::parse_from_rfc3339(&logged_at_str)
                .context("Invalid logged_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
