use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{
    at_risk_clients, capital_at_risk, command_total, compare_periods, daily_flow, due_reminders,
    income_by_category, low_stock, merge_contract, period_totals, rank_clients_by_value,
    validate_payments, AnamnesisAnswer, AnamnesisForm, Appointment, AppointmentId,
    AppointmentStatus, Cents, Client, ClientId, Command, CommandId, CommandItem, CommandPayment,
    CommandStatus, ContractData, MessageLogEntry, MessageTemplate, MessageTrigger, MessageValues,
    PaymentKind, PaymentMethod, Product, Professional, Transaction, TransactionKind,
    CHURN_THRESHOLD_DAYS,
};
use crate::storage::Repository;

use super::reporting::{
    CategoryReport, ChurnReport, DailyFlowReport, InventoryReport, SummaryReport, TopClientsReport,
};
use super::AppError;

/// Application service providing high-level operations for the studio.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct StudioService {
    repo: Repository,
}

/// Result of booking an appointment
pub struct BookingResult {
    pub appointment: Appointment,
    pub client: Client,
    /// True when the client record was created as part of this booking
    pub client_created: bool,
}

/// Detailed client information for the profile view
pub struct ClientProfile {
    pub client: Client,
    pub total_spent: Cents,
    pub appointment_count: i64,
    pub last_appointment: Option<DateTime<Utc>>,
}

/// Commission owed to one professional from a comanda
pub struct CommissionLine {
    pub professional: Professional,
    pub amount_cents: Cents,
}

/// A comanda with its line items resolved
pub struct CommandDetails {
    pub command: Command,
    pub client: Client,
    pub items: Vec<CommandItem>,
    pub total_cents: Cents,
}

/// One payment of a checkout, with what the studio actually receives after
/// the acquirer fee
pub struct PaymentLine {
    pub method: PaymentMethod,
    pub gross_cents: Cents,
    pub fee_cents: Cents,
    pub net_cents: Cents,
}

/// Result of closing a comanda
pub struct CheckoutResult {
    pub command: Command,
    pub total_cents: Cents,
    pub transactions: Vec<Transaction>,
    pub payments: Vec<PaymentLine>,
    pub commissions: Vec<CommissionLine>,
}

/// A reminder rendered by the campaign run
pub struct RenderedMessage {
    pub template_name: String,
    pub client_name: String,
    pub whatsapp: Option<String>,
    pub body: String,
}

impl StudioService {
    /// Create a new studio service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, studio_name: Option<&str>) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        let service = Self::new(repo);
        if let Some(name) = studio_name {
            service.repo.set_setting("studio_name", name).await?;
        }
        Ok(service)
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Studio display name used in messages and contracts.
    pub async fn studio_name(&self) -> Result<String, AppError> {
        Ok(self
            .repo
            .get_setting("studio_name")
            .await?
            .unwrap_or_else(|| "Studio".to_string()))
    }

    // ========================
    // Client operations
    // ========================

    /// Create a new client.
    pub async fn create_client(
        &self,
        name: String,
        whatsapp: Option<String>,
        document: Option<String>,
        address: Option<String>,
        referral_source: Option<String>,
        notes: Option<String>,
    ) -> Result<Client, AppError> {
        if self.repo.get_client_by_name(&name).await?.is_some() {
            return Err(AppError::ClientAlreadyExists(name));
        }

        let mut client = Client::new(name);
        if let Some(v) = whatsapp {
            client = client.with_whatsapp(v);
        }
        if let Some(v) = document {
            client = client.with_document(v);
        }
        if let Some(v) = address {
            client = client.with_address(v);
        }
        if let Some(v) = referral_source {
            client = client.with_referral_source(v);
        }
        if let Some(v) = notes {
            client = client.with_notes(v);
        }

        self.repo.save_client(&client).await?;
        Ok(client)
    }

    /// Get a client by name.
    pub async fn get_client(&self, name: &str) -> Result<Client, AppError> {
        self.repo
            .get_client_by_name(name)
            .await?
            .ok_or_else(|| AppError::ClientNotFound(name.to_string()))
    }

    /// Get a client by id.
    pub async fn get_client_by_id(&self, id: ClientId) -> Result<Client, AppError> {
        self.repo
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::ClientNotFound(id.to_string()))
    }

    /// Update a client's contact fields. `None` leaves a field as it is.
    pub async fn update_client(
        &self,
        name: &str,
        whatsapp: Option<String>,
        document: Option<String>,
        address: Option<String>,
        referral_source: Option<String>,
        notes: Option<String>,
    ) -> Result<Client, AppError> {
        let mut client = self.get_client(name).await?;
        if let Some(v) = whatsapp {
            client.whatsapp = Some(v);
        }
        if let Some(v) = document {
            client.document = Some(v);
        }
        if let Some(v) = address {
            client.address = Some(v);
        }
        if let Some(v) = referral_source {
            client.referral_source = Some(v);
        }
        if let Some(v) = notes {
            client.notes = Some(v);
        }
        self.repo.update_client(&client).await?;
        Ok(client)
    }

    /// List all clients.
    pub async fn list_clients(&self, include_archived: bool) -> Result<Vec<Client>, AppError> {
        Ok(self.repo.list_clients(include_archived).await?)
    }

    /// Archive a client (soft delete).
    pub async fn archive_client(&self, name: &str) -> Result<Client, AppError> {
        let client = self.get_client(name).await?;
        self.repo.archive_client(client.id).await?;
        Ok(client)
    }

    /// Get the profile view: client plus derived lifetime numbers.
    pub async fn get_client_profile(&self, name: &str) -> Result<ClientProfile, AppError> {
        let client = self.get_client(name).await?;
        let total_spent = self.repo.sum_income_for_client(client.id).await?;
        let appointment_count = self.repo.count_appointments_for_client(client.id).await?;
        let last_appointment = self.repo.last_appointment_date(client.id).await?;

        Ok(ClientProfile {
            client,
            total_spent,
            appointment_count,
            last_appointment,
        })
    }

    // ========================
    // Team operations
    // ========================

    /// Add a professional to the team.
    pub async fn create_professional(
        &self,
        name: String,
        role: String,
        commission_bps: i64,
    ) -> Result<Professional, AppError> {
        if self.repo.get_professional_by_name(&name).await?.is_some() {
            return Err(AppError::ProfessionalAlreadyExists(name));
        }
        if !(0..=10_000).contains(&commission_bps) {
            return Err(AppError::InvalidAmount(format!(
                "commission must be 0..=10000 basis points, got {}",
                commission_bps
            )));
        }

        let professional = Professional::new(name, role, commission_bps);
        self.repo.save_professional(&professional).await?;
        Ok(professional)
    }

    /// Get a professional by name.
    pub async fn get_professional(&self, name: &str) -> Result<Professional, AppError> {
        self.repo
            .get_professional_by_name(name)
            .await?
            .ok_or_else(|| AppError::ProfessionalNotFound(name.to_string()))
    }

    /// List the team.
    pub async fn list_professionals(
        &self,
        include_archived: bool,
    ) -> Result<Vec<Professional>, AppError> {
        Ok(self.repo.list_professionals(include_archived).await?)
    }

    /// Archive a professional.
    pub async fn archive_professional(&self, name: &str) -> Result<Professional, AppError> {
        let professional = self.get_professional(name).await?;
        self.repo.archive_professional(professional.id).await?;
        Ok(professional)
    }

    // ========================
    // Payment method operations
    // ========================

    /// Configure a payment method.
    pub async fn create_payment_method(
        &self,
        name: String,
        kind: PaymentKind,
        fee_bps: i64,
        max_installments: i64,
    ) -> Result<PaymentMethod, AppError> {
        if self.repo.get_payment_method_by_name(&name).await?.is_some() {
            return Err(AppError::PaymentMethodAlreadyExists(name));
        }
        if !(0..=10_000).contains(&fee_bps) {
            return Err(AppError::InvalidAmount(format!(
                "fee must be 0..=10000 basis points, got {}",
                fee_bps
            )));
        }
        if max_installments < 1 {
            return Err(AppError::InvalidAmount(
                "installments must be at least 1".to_string(),
            ));
        }

        let method = PaymentMethod::new(name, kind, fee_bps, max_installments);
        self.repo.save_payment_method(&method).await?;
        Ok(method)
    }

    /// Get a payment method by name.
    pub async fn get_payment_method(&self, name: &str) -> Result<PaymentMethod, AppError> {
        self.repo
            .get_payment_method_by_name(name)
            .await?
            .ok_or_else(|| AppError::PaymentMethodNotFound(name.to_string()))
    }

    /// List payment methods.
    pub async fn list_payment_methods(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<PaymentMethod>, AppError> {
        Ok(self.repo.list_payment_methods(include_inactive).await?)
    }

    /// Deactivate a payment method (it stays referenced by old transactions).
    pub async fn deactivate_payment_method(&self, name: &str) -> Result<PaymentMethod, AppError> {
        let method = self.get_payment_method(name).await?;
        self.repo.deactivate_payment_method(method.id).await?;
        Ok(method)
    }

    // ========================
    // Product operations
    // ========================

    /// Register a product.
    pub async fn create_product(
        &self,
        name: String,
        stock_quantity: i64,
        cost_price_cents: Cents,
        sale_price_cents: Cents,
        min_stock: i64,
    ) -> Result<Product, AppError> {
        if self.repo.get_product_by_name(&name).await?.is_some() {
            return Err(AppError::ProductAlreadyExists(name));
        }
        if stock_quantity < 0 || cost_price_cents < 0 || sale_price_cents < 0 || min_stock < 0 {
            return Err(AppError::InvalidAmount(
                "stock, prices and min-stock must not be negative".to_string(),
            ));
        }

        let product = Product::new(
            name,
            stock_quantity,
            cost_price_cents,
            sale_price_cents,
            min_stock,
        );
        self.repo.save_product(&product).await?;
        Ok(product)
    }

    /// Get a product by name.
    pub async fn get_product(&self, name: &str) -> Result<Product, AppError> {
        self.repo
            .get_product_by_name(name)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(name.to_string()))
    }

    /// List products.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.list_products().await?)
    }

    /// Adjust stock by a delta (restock positive, correction negative).
    pub async fn adjust_stock(&self, name: &str, delta: i64) -> Result<Product, AppError> {
        let mut product = self.get_product(name).await?;
        let new_quantity = product.stock_quantity + delta;
        if new_quantity < 0 {
            return Err(AppError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: -delta,
            });
        }
        self.repo.set_stock(product.id, new_quantity).await?;
        product.stock_quantity = new_quantity;
        Ok(product)
    }

    // ========================
    // Appointment operations
    // ========================

    /// Book an appointment. The client is looked up by name and created on
    /// the fly when missing (walk-in bookings). Writes are sequential: a
    /// created client stays even if the appointment insert fails.
    pub async fn book_appointment(
        &self,
        client_name: &str,
        service: String,
        scheduled_at: DateTime<Utc>,
        duration_min: i64,
        professional_name: Option<&str>,
        notes: Option<String>,
    ) -> Result<BookingResult, AppError> {
        if duration_min <= 0 {
            return Err(AppError::InvalidAmount(
                "duration must be positive".to_string(),
            ));
        }

        let (client, client_created) = match self.repo.get_client_by_name(client_name).await? {
            Some(client) => {
                if client.is_archived() {
                    return Err(AppError::ClientArchived(client_name.to_string()));
                }
                (client, false)
            }
            None => {
                let client = Client::new(client_name.to_string());
                self.repo.save_client(&client).await?;
                (client, true)
            }
        };

        let mut appointment = Appointment::new(
            client.id,
            client.name.clone(),
            service,
            scheduled_at,
            duration_min,
        );

        if let Some(name) = professional_name {
            let professional = self.get_professional(name).await?;
            appointment = appointment.with_professional(professional.id);
        }
        if let Some(notes) = notes {
            appointment = appointment.with_notes(notes);
        }

        self.repo.save_appointment(&appointment).await?;

        Ok(BookingResult {
            appointment,
            client,
            client_created,
        })
    }

    /// Get an appointment by id.
    pub async fn get_appointment(&self, id: AppointmentId) -> Result<Appointment, AppError> {
        self.repo
            .get_appointment(id)
            .await?
            .ok_or_else(|| AppError::AppointmentNotFound(id.to_string()))
    }

    /// Move an appointment to a new status, enforcing the transition rules.
    pub async fn transition_appointment(
        &self,
        id: AppointmentId,
        to: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        let mut appointment = self.get_appointment(id).await?;
        if !appointment.status.can_transition_to(to) {
            return Err(AppError::InvalidStatusTransition {
                from: appointment.status,
                to,
            });
        }
        self.repo.update_appointment_status(id, to).await?;
        appointment.status = to;
        Ok(appointment)
    }

    /// Agenda for one calendar day.
    pub async fn agenda_for_day(&self, day: NaiveDate) -> Result<Vec<Appointment>, AppError> {
        let from = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let to = from + Duration::days(1);
        Ok(self.repo.list_appointments_between(from, to).await?)
    }

    /// Appointments in a date range.
    pub async fn list_appointments(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(self.repo.list_appointments_between(from, to).await?)
    }

    /// A client's appointment history.
    pub async fn list_appointments_for_client(
        &self,
        client_name: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        let client = self.get_client(client_name).await?;
        Ok(self.repo.list_appointments_for_client(client.id).await?)
    }

    // ========================
    // Anamnesis operations
    // ========================

    /// Record an anamnesis form for a client. Signing requires consent.
    pub async fn record_anamnesis(
        &self,
        client_name: &str,
        answers: Vec<AnamnesisAnswer>,
        consent: bool,
        sign: bool,
    ) -> Result<AnamnesisForm, AppError> {
        let client = self.get_client(client_name).await?;

        let mut form = AnamnesisForm::new(client.id, answers);
        if sign {
            if !consent {
                return Err(AppError::ConsentRequired);
            }
            form.sign(true, Utc::now());
        } else {
            form.consent = consent;
        }

        self.repo.save_anamnesis(&form).await?;
        Ok(form)
    }

    /// Latest form for a client.
    pub async fn latest_anamnesis(&self, client_name: &str) -> Result<AnamnesisForm, AppError> {
        let client = self.get_client(client_name).await?;
        self.repo
            .latest_anamnesis_for_client(client.id)
            .await?
            .ok_or_else(|| AppError::AnamnesisNotFound(client_name.to_string()))
    }

    /// All forms for a client, newest first.
    pub async fn list_anamnesis(&self, client_name: &str) -> Result<Vec<AnamnesisForm>, AppError> {
        let client = self.get_client(client_name).await?;
        Ok(self.repo.list_anamnesis_for_client(client.id).await?)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a standalone transaction (expenses, income outside a comanda).
    pub async fn record_transaction(
        &self,
        kind: TransactionKind,
        amount_cents: Cents,
        category: String,
        occurred_at: DateTime<Utc>,
        description: Option<String>,
        client_name: Option<&str>,
        payment_method_name: Option<&str>,
    ) -> Result<Transaction, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }

        let mut tx = Transaction::new(kind, amount_cents, category, occurred_at);
        if let Some(description) = description {
            tx = tx.with_description(description);
        }
        if let Some(name) = client_name {
            let client = self.get_client(name).await?;
            tx = tx.with_client(client.id);
        }
        if let Some(name) = payment_method_name {
            let method = self.get_payment_method(name).await?;
            tx = tx.with_payment_method(method.id);
        }

        self.repo.save_transaction(&tx).await?;
        Ok(tx)
    }

    /// Transactions in a window, oldest first.
    pub async fn list_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions_between(from, to).await?)
    }

    // ========================
    // Comanda operations
    // ========================

    /// Open a comanda for a client. One open comanda per client.
    pub async fn open_command(&self, client_name: &str) -> Result<Command, AppError> {
        let client = self.get_client(client_name).await?;
        if client.is_archived() {
            return Err(AppError::ClientArchived(client_name.to_string()));
        }
        if let Some(open) = self.repo.open_command_for_client(client.id).await? {
            return Err(AppError::CommandAlreadyOpen(open.id.to_string()));
        }

        let command = Command::open(client.id);
        self.repo.save_command(&command).await?;
        Ok(command)
    }

    async fn get_open_command(&self, id: CommandId) -> Result<Command, AppError> {
        let command = self
            .repo
            .get_command(id)
            .await?
            .ok_or_else(|| AppError::CommandNotFound(id.to_string()))?;
        if !command.is_open() {
            return Err(AppError::CommandNotOpen(id.to_string()));
        }
        Ok(command)
    }

    /// Add a service line to an open comanda.
    pub async fn add_service_item(
        &self,
        command_id: CommandId,
        description: String,
        price_cents: Cents,
        professional_name: Option<&str>,
    ) -> Result<CommandItem, AppError> {
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "price must not be negative".to_string(),
            ));
        }
        let command = self.get_open_command(command_id).await?;

        let professional_id = match professional_name {
            Some(name) => Some(self.get_professional(name).await?.id),
            None => None,
        };

        let item = CommandItem::service(command.id, description, professional_id, price_cents);
        self.repo.save_command_item(&item).await?;
        Ok(item)
    }

    /// Add a product line to an open comanda. Stock is checked here and
    /// decremented at close.
    pub async fn add_product_item(
        &self,
        command_id: CommandId,
        product_name: &str,
        quantity: i64,
    ) -> Result<CommandItem, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidAmount(
                "quantity must be positive".to_string(),
            ));
        }
        let command = self.get_open_command(command_id).await?;
        let product = self.get_product(product_name).await?;

        if product.stock_quantity < quantity {
            return Err(AppError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        let item = CommandItem::product(
            command.id,
            product.name.clone(),
            product.id,
            quantity,
            product.sale_price_cents,
        );
        self.repo.save_command_item(&item).await?;
        Ok(item)
    }

    /// Resolve a comanda with its items and total.
    pub async fn get_command_details(&self, id: CommandId) -> Result<CommandDetails, AppError> {
        let command = self
            .repo
            .get_command(id)
            .await?
            .ok_or_else(|| AppError::CommandNotFound(id.to_string()))?;
        let client = self.get_client_by_id(command.client_id).await?;
        let items = self.repo.list_command_items(command.id).await?;
        let total_cents = command_total(&items);

        Ok(CommandDetails {
            command,
            client,
            items,
            total_cents,
        })
    }

    /// The open comanda for a client, if any.
    pub async fn find_open_command(&self, client_name: &str) -> Result<Command, AppError> {
        let client = self.get_client(client_name).await?;
        self.repo
            .open_command_for_client(client.id)
            .await?
            .ok_or_else(|| AppError::CommandNotFound(client_name.to_string()))
    }

    /// Close a comanda with one or more payments. Each payment becomes a
    /// settled income transaction; product lines come off stock. The steps
    /// are sequential awaits with no compensating rollback.
    pub async fn close_command(
        &self,
        id: CommandId,
        payments: Vec<CommandPayment>,
    ) -> Result<CheckoutResult, AppError> {
        let mut command = self.get_open_command(id).await?;
        let items = self.repo.list_command_items(command.id).await?;
        if items.is_empty() {
            return Err(AppError::CommandEmpty(id.to_string()));
        }

        let total_cents = command_total(&items);
        validate_payments(total_cents, &payments).map_err(|e| AppError::PaymentMismatch {
            total: e.total,
            tendered: e.tendered,
        })?;

        // Validate the payment methods are real and active before writing
        let mut methods = Vec::with_capacity(payments.len());
        for payment in &payments {
            let method = self
                .repo
                .get_payment_method(payment.payment_method_id)
                .await?
                .ok_or_else(|| {
                    AppError::PaymentMethodNotFound(payment.payment_method_id.to_string())
                })?;
            if !method.active {
                return Err(AppError::PaymentMethodInactive(method.name));
            }
            methods.push(method);
        }

        // Stock first: a failure here leaves the comanda open and untouched
        for item in items.iter().filter(|i| i.product_id.is_some()) {
            let product_id = item.product_id.unwrap();
            let taken = self.repo.take_stock(product_id, item.quantity).await?;
            if !taken {
                return Err(AppError::InsufficientStock {
                    product: item.description.clone(),
                    available: self
                        .repo
                        .get_product(product_id)
                        .await?
                        .map(|p| p.stock_quantity)
                        .unwrap_or(0),
                    requested: item.quantity,
                });
            }
        }

        let now = Utc::now();
        let id_str = command.id.to_string();
        let short_id = &id_str[..8];
        let mut transactions = Vec::with_capacity(payments.len());
        for (payment, method) in payments.iter().zip(&methods) {
            let tx = Transaction::new(
                TransactionKind::Income,
                payment.amount_cents,
                "comanda".to_string(),
                now,
            )
            .with_description(format!("Comanda {}", short_id))
            .with_client(command.client_id)
            .with_payment_method(method.id);
            self.repo.save_transaction(&tx).await?;
            transactions.push(tx);
        }

        self.repo.close_command(command.id, now).await?;
        command.status = CommandStatus::Closed;
        command.closed_at = Some(now);

        let payment_lines = payments
            .iter()
            .zip(methods)
            .map(|(payment, method)| {
                let fee_cents = method.fee_for(payment.amount_cents);
                let net_cents = method.net_amount(payment.amount_cents);
                PaymentLine {
                    method,
                    gross_cents: payment.amount_cents,
                    fee_cents,
                    net_cents,
                }
            })
            .collect();

        let commissions = self.commissions_for_items(&items).await?;

        Ok(CheckoutResult {
            command,
            total_cents,
            transactions,
            payments: payment_lines,
            commissions,
        })
    }

    /// Cancel an open comanda. Nothing is written to the ledger.
    pub async fn cancel_command(&self, id: CommandId) -> Result<Command, AppError> {
        let mut command = self.get_open_command(id).await?;
        self.repo.cancel_command(command.id).await?;
        command.status = CommandStatus::Cancelled;
        Ok(command)
    }

    async fn commissions_for_items(
        &self,
        items: &[CommandItem],
    ) -> Result<Vec<CommissionLine>, AppError> {
        use std::collections::HashMap;

        let mut per_professional: HashMap<uuid::Uuid, Cents> = HashMap::new();
        for item in items {
            if let Some(professional_id) = item.professional_id {
                *per_professional.entry(professional_id).or_insert(0) += item.total_cents();
            }
        }

        let mut lines = Vec::new();
        for (professional_id, serviced) in per_professional {
            let professional = self
                .repo
                .get_professional(professional_id)
                .await?
                .ok_or_else(|| AppError::ProfessionalNotFound(professional_id.to_string()))?;
            let amount_cents = professional.commission_for(serviced);
            lines.push(CommissionLine {
                professional,
                amount_cents,
            });
        }
        lines.sort_by(|a, b| a.professional.name.cmp(&b.professional.name));
        Ok(lines)
    }

    // ========================
    // Campaign operations
    // ========================

    /// Create a message template.
    pub async fn create_template(
        &self,
        name: String,
        trigger: MessageTrigger,
        body: String,
        hours_before: Option<i64>,
    ) -> Result<MessageTemplate, AppError> {
        if self.repo.get_template_by_name(&name).await?.is_some() {
            return Err(AppError::TemplateAlreadyExists(name));
        }

        let mut template = MessageTemplate::new(name, trigger, body);
        if let Some(hours) = hours_before {
            if hours <= 0 {
                return Err(AppError::InvalidAmount(
                    "reminder lead time must be positive".to_string(),
                ));
            }
            template = template.with_hours_before(hours);
        }

        self.repo.save_template(&template).await?;
        Ok(template)
    }

    /// List templates.
    pub async fn list_templates(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<MessageTemplate>, AppError> {
        Ok(self.repo.list_templates(include_inactive).await?)
    }

    /// Deactivate a template.
    pub async fn deactivate_template(&self, name: &str) -> Result<MessageTemplate, AppError> {
        let template = self
            .repo
            .get_template_by_name(name)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound(name.to_string()))?;
        self.repo.deactivate_template(template.id).await?;
        Ok(template)
    }

    /// Render the confirmation message for an appointment, on demand.
    pub async fn render_confirmation(
        &self,
        appointment_id: AppointmentId,
    ) -> Result<RenderedMessage, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;
        let client = self.get_client_by_id(appointment.client_id).await?;
        let template = self
            .repo
            .first_active_template(MessageTrigger::Confirmation)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound("confirmation".to_string()))?;

        let body = template.render(&self.values_for(&appointment).await?);
        Ok(RenderedMessage {
            template_name: template.name,
            client_name: client.name,
            whatsapp: client.whatsapp,
            body,
        })
    }

    /// Reminders whose send window is open right now. Pure computation over
    /// fetched rows; nothing is logged.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<RenderedMessage>, AppError> {
        let templates = self.repo.list_templates(false).await?;
        let appointments = self.repo.list_upcoming_appointments(now).await?;
        let log = self.repo.list_message_log().await?;
        let studio = self.studio_name().await?;

        let mut rendered = Vec::new();
        for due in due_reminders(&templates, &appointments, &log, now) {
            let client = self.get_client_by_id(due.appointment.client_id).await?;
            let professional = match due.appointment.professional_id {
                Some(id) => self
                    .repo
                    .get_professional(id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default(),
                None => String::new(),
            };
            let values = MessageValues::for_appointment(due.appointment, &professional, &studio);
            rendered.push(RenderedMessage {
                template_name: due.template.name.clone(),
                client_name: client.name,
                whatsapp: client.whatsapp,
                body: due.template.render(&values),
            });
        }
        Ok(rendered)
    }

    /// Render due reminders and append them to the message log so the next
    /// run skips them. Returns what was rendered.
    pub async fn send_due_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RenderedMessage>, AppError> {
        let templates = self.repo.list_templates(false).await?;
        let appointments = self.repo.list_upcoming_appointments(now).await?;
        let log = self.repo.list_message_log().await?;
        let studio = self.studio_name().await?;

        let mut rendered = Vec::new();
        for due in due_reminders(&templates, &appointments, &log, now) {
            let client = self.get_client_by_id(due.appointment.client_id).await?;
            let professional = match due.appointment.professional_id {
                Some(id) => self
                    .repo
                    .get_professional(id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default(),
                None => String::new(),
            };
            let values = MessageValues::for_appointment(due.appointment, &professional, &studio);
            let body = due.template.render(&values);

            let entry = MessageLogEntry::new(
                due.template.id,
                due.appointment.client_id,
                Some(due.appointment.id),
                body.clone(),
            );
            self.repo.save_message_log(&entry).await?;

            rendered.push(RenderedMessage {
                template_name: due.template.name.clone(),
                client_name: client.name,
                whatsapp: client.whatsapp,
                body,
            });
        }
        Ok(rendered)
    }

    /// Render the winback message for every at-risk client not yet contacted
    /// with this template, and log each one.
    pub async fn send_winback(
        &self,
        now: DateTime<Utc>,
        threshold_days: i64,
    ) -> Result<Vec<RenderedMessage>, AppError> {
        let template = self
            .repo
            .first_active_template(MessageTrigger::Winback)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound("winback".to_string()))?;

        let clients = self.repo.list_clients(false).await?;
        let appointments = self.repo.list_appointments().await?;
        let log = self.repo.list_message_log().await?;
        let studio = self.studio_name().await?;

        let mut rendered = Vec::new();
        for at_risk in at_risk_clients(&clients, &appointments, now, threshold_days) {
            let already = log
                .iter()
                .any(|e| e.template_id == template.id && e.client_id == at_risk.client_id);
            if already {
                continue;
            }

            let values = MessageValues {
                client_name: at_risk.name.clone(),
                studio: studio.clone(),
                ..Default::default()
            };
            let body = template.render(&values);

            let entry = MessageLogEntry::new(template.id, at_risk.client_id, None, body.clone());
            self.repo.save_message_log(&entry).await?;

            rendered.push(RenderedMessage {
                template_name: template.name.clone(),
                client_name: at_risk.name,
                whatsapp: at_risk.whatsapp,
                body,
            });
        }
        Ok(rendered)
    }

    /// The message log, newest first.
    pub async fn list_message_log(&self) -> Result<Vec<MessageLogEntry>, AppError> {
        let mut log = self.repo.list_message_log().await?;
        log.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        Ok(log)
    }

    async fn values_for(&self, appointment: &Appointment) -> Result<MessageValues, AppError> {
        let studio = self.studio_name().await?;
        let professional = match appointment.professional_id {
            Some(id) => self
                .repo
                .get_professional(id)
                .await?
                .map(|p| p.name)
                .unwrap_or_default(),
            None => String::new(),
        };
        Ok(MessageValues::for_appointment(
            appointment,
            &professional,
            &studio,
        ))
    }

    // ========================
    // Contract operations
    // ========================

    /// Merge a client's record into a contract template.
    pub async fn generate_contract(
        &self,
        client_name: &str,
        template: Option<&str>,
        image_use_authorized: bool,
    ) -> Result<String, AppError> {
        let client = self.get_client(client_name).await?;
        let data = ContractData {
            client_name: client.name,
            document: client.document,
            address: client.address,
            image_use_authorized,
        };
        let template = template.unwrap_or(crate::domain::DEFAULT_CONTRACT_TEMPLATE);
        Ok(merge_contract(template, &data, Utc::now()))
    }

    // ========================
    // Reporting operations
    // ========================

    /// Period totals compared against the immediately preceding period of
    /// equal length, plus the income category distribution.
    pub async fn get_summary_report(
        &self,
        from_date: DateTime<Utc>,
        to_date: DateTime<Utc>,
    ) -> Result<SummaryReport, AppError> {
        let window = to_date - from_date;
        let current_txs = self.repo.list_transactions_between(from_date, to_date).await?;
        let previous_txs = self
            .repo
            .list_transactions_between(from_date - window, from_date)
            .await?;

        let current = period_totals(&current_txs);
        let previous = period_totals(&previous_txs);
        let comparison = compare_periods(current, previous);
        let top_categories = income_by_category(&current_txs);

        Ok(SummaryReport {
            from_date,
            to_date,
            current,
            previous,
            change: comparison.change,
            change_percentage: comparison.change_percentage,
            top_categories,
        })
    }

    /// Day-by-day income/expense series.
    pub async fn get_daily_report(
        &self,
        from_day: NaiveDate,
        to_day: NaiveDate,
    ) -> Result<DailyFlowReport, AppError> {
        let from = from_day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let to = (to_day + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let transactions = self.repo.list_transactions_between(from, to).await?;

        Ok(DailyFlowReport {
            from_day,
            to_day,
            days: daily_flow(from_day, to_day, &transactions),
        })
    }

    /// Income distribution by category.
    pub async fn get_category_report(
        &self,
        from_date: DateTime<Utc>,
        to_date: DateTime<Utc>,
    ) -> Result<CategoryReport, AppError> {
        let transactions = self.repo.list_transactions_between(from_date, to_date).await?;
        let categories = income_by_category(&transactions);
        let total_income = period_totals(&transactions).income;

        Ok(CategoryReport {
            from_date,
            to_date,
            total_income,
            categories,
        })
    }

    /// Lifetime-value top 10.
    pub async fn get_top_clients_report(&self) -> Result<TopClientsReport, AppError> {
        let clients = self.repo.list_clients(true).await?;
        let transactions = self.repo.list_transactions().await?;
        Ok(TopClientsReport {
            clients: rank_clients_by_value(&clients, &transactions, 10),
        })
    }

    /// Clients at churn risk.
    pub async fn get_churn_report(
        &self,
        threshold_days: Option<i64>,
    ) -> Result<ChurnReport, AppError> {
        let threshold_days = threshold_days.unwrap_or(CHURN_THRESHOLD_DAYS);
        let clients = self.repo.list_clients(false).await?;
        let appointments = self.repo.list_appointments().await?;

        Ok(ChurnReport {
            threshold_days,
            clients: at_risk_clients(&clients, &appointments, Utc::now(), threshold_days),
        })
    }

    /// Capital tied up in stock and reorder candidates.
    pub async fn get_inventory_report(&self) -> Result<InventoryReport, AppError> {
        let products = self.repo.list_products().await?;
        Ok(InventoryReport {
            capital_at_risk: capital_at_risk(&products),
            low_stock: low_stock(&products).into_iter().cloned().collect(),
        })
    }

    // ========================
    // Export support
    // ========================

    /// Every transaction, oldest first.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions().await?)
    }

    /// Every appointment, oldest first.
    pub async fn list_all_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        Ok(self.repo.list_appointments().await?)
    }
}
