use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{AppError, StudioService};
use crate::domain::{
    format_cents, parse_amount, AnamnesisAnswer, AppointmentStatus, CommandPayment,
    MessageTrigger, PaymentKind, TransactionKind, DEFAULT_CONFIRMATION_BODY, DEFAULT_REMINDER_BODY,
    DEFAULT_WINBACK_BODY, STANDARD_QUESTIONS,
};
use crate::io::{Exporter, Importer, ImportOptions};

/// Studiolo - Salon & Studio Management
#[derive(Parser)]
#[command(name = "studiolo")]
#[command(about = "A local-first salon & studio management tool")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "studiolo.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init {
        /// Studio display name (used in messages and contracts)
        #[arg(long)]
        name: Option<String>,
    },

    /// Client management commands
    #[command(subcommand)]
    Client(ClientCommands),

    /// Team (professional) management commands
    #[command(subcommand)]
    Team(TeamCommands),

    /// Appointment scheduling commands
    #[command(subcommand)]
    Appointment(AppointmentCommands),

    /// Anamnesis (intake form) commands
    #[command(subcommand)]
    Anamnesis(AnamnesisCommands),

    /// Payment method configuration commands
    #[command(name = "payment-method", subcommand)]
    PaymentMethod(PaymentMethodCommands),

    /// Product and stock commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Record standalone income and expenses
    #[command(subcommand)]
    Transaction(TransactionCommands),

    /// Comanda (client tab) commands
    #[command(subcommand)]
    Comanda(ComandaCommands),

    /// Generate a filled service contract
    Contract {
        /// Client name
        client: String,

        /// Template file (uses the built-in template if omitted)
        #[arg(short, long)]
        template: Option<String>,

        /// Client authorized image use in studio publicity
        #[arg(long)]
        authorize_image: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// WhatsApp campaign commands
    #[command(subcommand)]
    Campaign(CampaignCommands),

    /// Generate reports and analytics
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: clients, transactions, appointments, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import data from CSV
    Import {
        /// What to import: clients, transactions
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip records that already exist
        #[arg(long)]
        skip_duplicates: bool,

        /// Validate without importing
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Create a new client
    Create {
        /// Client name (must be unique)
        name: String,

        /// WhatsApp number
        #[arg(short, long)]
        whatsapp: Option<String>,

        /// Document number (CPF)
        #[arg(long)]
        document: Option<String>,

        /// Address
        #[arg(long)]
        address: Option<String>,

        /// How the client found the studio
        #[arg(short, long)]
        referral: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List all clients
    List {
        /// Include archived clients
        #[arg(long)]
        all: bool,
    },

    /// Show a client's profile with lifetime numbers
    Show {
        /// Client name
        name: String,
    },

    /// Update a client's contact fields
    Update {
        /// Client name
        name: String,

        #[arg(short, long)]
        whatsapp: Option<String>,

        #[arg(long)]
        document: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(short, long)]
        referral: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Archive a client (soft delete)
    Archive {
        /// Client name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum TeamCommands {
    /// Add a professional to the team
    Add {
        /// Professional name (must be unique)
        name: String,

        /// Role (e.g. "cabeleireira", "esteticista")
        #[arg(short, long)]
        role: String,

        /// Commission in basis points (4000 = 40%)
        #[arg(short, long, default_value = "0")]
        commission: i64,
    },

    /// List the team
    List {
        /// Include archived professionals
        #[arg(long)]
        all: bool,
    },

    /// Archive a professional
    Archive {
        /// Professional name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// Book an appointment (creates the client if unknown)
    Book {
        /// Client name
        client: String,

        /// Service description
        #[arg(short, long)]
        service: String,

        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Time (HH:MM)
        #[arg(short, long)]
        time: String,

        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: i64,

        /// Professional name
        #[arg(short, long)]
        professional: Option<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark an appointment confirmed
    Confirm {
        /// Appointment ID
        id: String,
    },

    /// Mark an appointment concluded
    Conclude {
        /// Appointment ID
        id: String,
    },

    /// Cancel an appointment
    Cancel {
        /// Appointment ID
        id: String,
    },

    /// Show the agenda for a day
    Agenda {
        /// Date (YYYY-MM-DD, defaults to today)
        date: Option<String>,
    },

    /// List appointments in a date range
    List {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// A client's appointment history
    History {
        /// Client name
        client: String,
    },
}

#[derive(Subcommand)]
pub enum AnamnesisCommands {
    /// Print the standard intake questions
    Questions,

    /// Record an intake form for a client
    Record {
        /// Client name
        client: String,

        /// Answer as "question=answer"; prefix with '!' to flag a
        /// contraindication (repeatable)
        #[arg(short, long = "answer")]
        answers: Vec<String>,

        /// Client gave consent
        #[arg(long)]
        consent: bool,

        /// Sign the form now (requires --consent)
        #[arg(long)]
        sign: bool,
    },

    /// Show a client's latest form
    Show {
        /// Client name
        client: String,
    },

    /// List a client's form history
    History {
        /// Client name
        client: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentMethodCommands {
    /// Configure a payment method
    Add {
        /// Method name (must be unique)
        name: String,

        /// Kind: cash, pix, debit, credit
        #[arg(short, long)]
        kind: String,

        /// Acquirer fee in basis points (349 = 3.49%)
        #[arg(short, long, default_value = "0")]
        fee: i64,

        /// Maximum installments
        #[arg(short, long, default_value = "1")]
        installments: i64,
    },

    /// List payment methods
    List {
        /// Include inactive methods
        #[arg(long)]
        all: bool,
    },

    /// Deactivate a payment method
    Deactivate {
        /// Method name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Register a product
    Add {
        /// Product name (must be unique)
        name: String,

        /// Initial stock quantity
        #[arg(short, long, default_value = "0")]
        stock: i64,

        /// Cost price per unit (e.g. "15.00")
        #[arg(long)]
        cost: String,

        /// Sale price per unit (e.g. "45.00")
        #[arg(long)]
        price: String,

        /// Reorder threshold
        #[arg(long, default_value = "0")]
        min_stock: i64,
    },

    /// List products
    List,

    /// Adjust stock by a delta (restock positive, correction negative)
    Restock {
        /// Product name
        name: String,

        /// Quantity delta
        quantity: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record income outside a comanda
    Income {
        /// Amount (e.g. "150.00")
        amount: String,

        /// Category (e.g. "comanda", "sinal")
        #[arg(short, long)]
        category: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Client name
        #[arg(long)]
        client: Option<String>,

        /// Payment method name
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Record an expense
    Expense {
        /// Amount (e.g. "80.00")
        amount: String,

        /// Category (e.g. "aluguel", "insumos")
        #[arg(short, long)]
        category: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// List transactions in a date range
    List {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ComandaCommands {
    /// Open a comanda for a client
    Open {
        /// Client name
        client: String,
    },

    /// Add a service line to a client's open comanda
    AddService {
        /// Client name
        client: String,

        /// Service description
        #[arg(short, long)]
        description: String,

        /// Price (e.g. "80.00")
        #[arg(short, long)]
        price: String,

        /// Professional who performed it
        #[arg(long)]
        professional: Option<String>,
    },

    /// Add a product line to a client's open comanda
    AddProduct {
        /// Client name
        client: String,

        /// Product name
        #[arg(long)]
        product: String,

        /// Quantity
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },

    /// Show a client's open comanda
    Show {
        /// Client name
        client: String,
    },

    /// Close a client's open comanda with one or more payments
    Close {
        /// Client name
        client: String,

        /// Payment as "method=amount" (repeatable for split payments)
        #[arg(short, long = "pay")]
        payments: Vec<String>,
    },

    /// Cancel a client's open comanda
    Cancel {
        /// Client name
        client: String,
    },
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// Create a message template
    AddTemplate {
        /// Template name (must be unique)
        name: String,

        /// Trigger: confirmation, reminder, winback
        #[arg(short, long)]
        trigger: String,

        /// Message body with {cliente} {data} {hora} {servico}
        /// {profissional} {estudio} placeholders (built-in default if
        /// omitted)
        #[arg(short, long)]
        body: Option<String>,

        /// Reminder lead time in hours
        #[arg(long)]
        hours_before: Option<i64>,
    },

    /// List templates
    Templates {
        /// Include inactive templates
        #[arg(long)]
        all: bool,
    },

    /// Deactivate a template
    Deactivate {
        /// Template name
        name: String,
    },

    /// Show reminders that are due now, without logging them
    Due,

    /// Render due reminders and log them as sent
    Send,

    /// Render winback messages for at-risk clients and log them
    Winback {
        /// Days without a visit before a client counts as at risk
        #[arg(long, default_value = "45")]
        days: i64,
    },

    /// Render the confirmation message for an appointment
    Confirmation {
        /// Appointment ID
        id: String,
    },

    /// Show the message log
    Log,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Period summary with previous-period comparison
    Summary {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Day-by-day income vs expense series
    Daily {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income distribution by category
    Categories {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Lifetime-value top 10 clients
    TopClients {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Clients at churn risk
    Churn {
        /// Days without a visit before a client counts as at risk
        #[arg(long, default_value = "45")]
        days: i64,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Stock capital and low-stock products
    Inventory {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if self.verbose {
            eprintln!("[studiolo] database: {}", self.database);
        }

        match self.command {
            Commands::Init { name } => {
                StudioService::init(&self.database, name.as_deref()).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Client(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_client_command(&service, cmd).await?;
            }

            Commands::Team(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_team_command(&service, cmd).await?;
            }

            Commands::Appointment(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_appointment_command(&service, cmd).await?;
            }

            Commands::Anamnesis(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_anamnesis_command(&service, cmd).await?;
            }

            Commands::PaymentMethod(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_payment_method_command(&service, cmd).await?;
            }

            Commands::Product(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_product_command(&service, cmd).await?;
            }

            Commands::Transaction(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_transaction_command(&service, cmd).await?;
            }

            Commands::Comanda(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_comanda_command(&service, cmd).await?;
            }

            Commands::Contract {
                client,
                template,
                authorize_image,
                output,
            } => {
                let service = StudioService::connect(&self.database).await?;
                let template_text = template
                    .map(std::fs::read_to_string)
                    .transpose()
                    .context("Failed to read template file")?;
                let contract = service
                    .generate_contract(&client, template_text.as_deref(), authorize_image)
                    .await?;

                match output {
                    Some(path) => {
                        std::fs::write(&path, &contract)
                            .context("Failed to write contract file")?;
                        println!("Contract written to {}", path);
                    }
                    None => println!("{}", contract),
                }
            }

            Commands::Campaign(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_campaign_command(&service, cmd).await?;
            }

            Commands::Report(cmd) => {
                let service = StudioService::connect(&self.database).await?;
                run_report_command(&service, cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = StudioService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output).await?;
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
                skip_duplicates,
                validate,
            } => {
                let service = StudioService::connect(&self.database).await?;
                let options = ImportOptions {
                    dry_run,
                    skip_duplicates,
                    validate_only: validate,
                };
                run_import_command(&service, &import_type, input, options).await?;
            }
        }

        Ok(())
    }
}

// ========================
// Command handlers
// ========================

async fn run_client_command(service: &StudioService, cmd: ClientCommands) -> Result<()> {
    match cmd {
        ClientCommands::Create {
            name,
            whatsapp,
            document,
            address,
            referral,
            notes,
        } => {
            let client = service
                .create_client(name, whatsapp, document, address, referral, notes)
                .await?;
            println!("Created client: {} ({})", client.name, client.id);
        }

        ClientCommands::List { all } => {
            let clients = service.list_clients(all).await?;
            if clients.is_empty() {
                println!("No clients found.");
                return Ok(());
            }

            println!(
                "{:<25} {:<16} {:<15} {:<10}",
                "NAME", "WHATSAPP", "REFERRAL", "STATUS"
            );
            println!("{}", "-".repeat(70));
            for client in clients {
                println!(
                    "{:<25} {:<16} {:<15} {:<10}",
                    truncate(&client.name, 25),
                    client.whatsapp.as_deref().unwrap_or("-"),
                    truncate(client.referral_source.as_deref().unwrap_or("-"), 15),
                    if client.is_archived() {
                        "archived"
                    } else {
                        "active"
                    }
                );
            }
        }

        ClientCommands::Show { name } => {
            let profile = service.get_client_profile(&name).await?;
            let client = &profile.client;

            println!("Client: {}", client.name);
            println!("  ID:          {}", client.id);
            println!(
                "  WhatsApp:    {}",
                client.whatsapp.as_deref().unwrap_or("-")
            );
            println!(
                "  Document:    {}",
                client.document.as_deref().unwrap_or("-")
            );
            println!("  Address:     {}", client.address.as_deref().unwrap_or("-"));
            println!(
                "  Referral:    {}",
                client.referral_source.as_deref().unwrap_or("-")
            );
            println!("  Since:       {}", client.created_at.format("%Y-%m-%d"));
            println!("  Visits:      {}", profile.appointment_count);
            println!(
                "  Last visit:  {}",
                profile
                    .last_appointment
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("  Total spent: {}", format_cents(profile.total_spent));
            if let Some(notes) = &client.notes {
                println!("  Notes:       {}", notes);
            }
        }

        ClientCommands::Update {
            name,
            whatsapp,
            document,
            address,
            referral,
            notes,
        } => {
            let client = service
                .update_client(&name, whatsapp, document, address, referral, notes)
                .await?;
            println!("Updated client: {}", client.name);
        }

        ClientCommands::Archive { name } => {
            let client = service.archive_client(&name).await?;
            println!("Archived client: {}", client.name);
        }
    }

    Ok(())
}

async fn run_team_command(service: &StudioService, cmd: TeamCommands) -> Result<()> {
    match cmd {
        TeamCommands::Add {
            name,
            role,
            commission,
        } => {
            let professional = service.create_professional(name, role, commission).await?;
            println!(
                "Added professional: {} ({}, commission {:.2}%)",
                professional.name,
                professional.role,
                professional.commission_bps as f64 / 100.0
            );
        }

        TeamCommands::List { all } => {
            let team = service.list_professionals(all).await?;
            if team.is_empty() {
                println!("No professionals found.");
                return Ok(());
            }

            println!(
                "{:<25} {:<20} {:>10} {:<10}",
                "NAME", "ROLE", "COMMISSION", "STATUS"
            );
            println!("{}", "-".repeat(70));
            for professional in team {
                println!(
                    "{:<25} {:<20} {:>9.2}% {:<10}",
                    truncate(&professional.name, 25),
                    truncate(&professional.role, 20),
                    professional.commission_bps as f64 / 100.0,
                    if professional.is_archived() {
                        "archived"
                    } else {
                        "active"
                    }
                );
            }
        }

        TeamCommands::Archive { name } => {
            let professional = service.archive_professional(&name).await?;
            println!("Archived professional: {}", professional.name);
        }
    }

    Ok(())
}

async fn run_appointment_command(service: &StudioService, cmd: AppointmentCommands) -> Result<()> {
    match cmd {
        AppointmentCommands::Book {
            client,
            service: service_name,
            date,
            time,
            duration,
            professional,
            notes,
        } => {
            let scheduled_at = parse_datetime(&date, &time)?;
            let result = service
                .book_appointment(
                    &client,
                    service_name,
                    scheduled_at,
                    duration,
                    professional.as_deref(),
                    notes,
                )
                .await?;

            if result.client_created {
                println!("Created client: {}", result.client.name);
            }
            println!(
                "Booked: {} - {} on {} ({})",
                result.appointment.client_name,
                result.appointment.service,
                result.appointment.scheduled_at.format("%Y-%m-%d %H:%M"),
                result.appointment.id
            );
        }

        AppointmentCommands::Confirm { id } => {
            let appointment = service
                .transition_appointment(parse_uuid(&id)?, AppointmentStatus::Confirmed)
                .await?;
            println!(
                "Confirmed: {} on {}",
                appointment.client_name,
                appointment.scheduled_at.format("%Y-%m-%d %H:%M")
            );
        }

        AppointmentCommands::Conclude { id } => {
            let appointment = service
                .transition_appointment(parse_uuid(&id)?, AppointmentStatus::Completed)
                .await?;
            println!(
                "Concluded: {} - {}",
                appointment.client_name, appointment.service
            );
        }

        AppointmentCommands::Cancel { id } => {
            let appointment = service
                .transition_appointment(parse_uuid(&id)?, AppointmentStatus::Cancelled)
                .await?;
            println!(
                "Cancelled: {} on {}",
                appointment.client_name,
                appointment.scheduled_at.format("%Y-%m-%d %H:%M")
            );
        }

        AppointmentCommands::Agenda { date } => {
            let day = match date {
                Some(s) => parse_naive_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let appointments = service.agenda_for_day(day).await?;

            println!("Agenda for {}", day);
            if appointments.is_empty() {
                println!("  (empty)");
                return Ok(());
            }

            for appointment in appointments {
                println!(
                    "  {} {:<10} {:<25} {:<20} {}",
                    appointment.scheduled_at.format("%H:%M"),
                    appointment.status.as_str(),
                    truncate(&appointment.client_name, 25),
                    truncate(&appointment.service, 20),
                    appointment.id
                );
            }
        }

        AppointmentCommands::List { from, to } => {
            let (from_date, to_date) = parse_date_range(from, to)?;
            let appointments = service.list_appointments(from_date, to_date).await?;

            if appointments.is_empty() {
                println!("No appointments in range.");
                return Ok(());
            }

            for appointment in appointments {
                println!(
                    "{} {:<10} {:<25} {:<20} {}",
                    appointment.scheduled_at.format("%Y-%m-%d %H:%M"),
                    appointment.status.as_str(),
                    truncate(&appointment.client_name, 25),
                    truncate(&appointment.service, 20),
                    appointment.id
                );
            }
        }

        AppointmentCommands::History { client } => {
            let appointments = service.list_appointments_for_client(&client).await?;
            if appointments.is_empty() {
                println!("No appointments for {}.", client);
                return Ok(());
            }

            for appointment in appointments {
                println!(
                    "{} {:<10} {}",
                    appointment.scheduled_at.format("%Y-%m-%d %H:%M"),
                    appointment.status.as_str(),
                    appointment.service
                );
            }
        }
    }

    Ok(())
}

async fn run_anamnesis_command(service: &StudioService, cmd: AnamnesisCommands) -> Result<()> {
    match cmd {
        AnamnesisCommands::Questions => {
            println!("Standard intake questions:");
            for (i, question) in STANDARD_QUESTIONS.iter().enumerate() {
                println!("  {}. {}", i + 1, question);
            }
        }

        AnamnesisCommands::Record {
            client,
            answers,
            consent,
            sign,
        } => {
            let parsed: Vec<AnamnesisAnswer> = answers
                .iter()
                .map(|raw| parse_answer(raw))
                .collect::<Result<_>>()?;

            let form = service.record_anamnesis(&client, parsed, consent, sign).await?;
            println!(
                "Recorded anamnesis for {} ({} answers{})",
                client,
                form.answers.len(),
                if form.is_signed() { ", signed" } else { "" }
            );

            let flagged = form.contraindications();
            if !flagged.is_empty() {
                println!("Contraindications:");
                for answer in flagged {
                    println!("  ! {} -> {}", answer.question, answer.answer);
                }
            }
        }

        AnamnesisCommands::Show { client } => {
            let form = service.latest_anamnesis(&client).await?;
            println!(
                "Anamnesis for {} ({})",
                client,
                form.created_at.format("%Y-%m-%d")
            );
            for answer in &form.answers {
                let marker = if answer.contraindication { "!" } else { " " };
                println!("  {} {} -> {}", marker, answer.question, answer.answer);
            }
            println!(
                "Consent: {}  Signed: {}",
                if form.consent { "yes" } else { "no" },
                form.signed_at
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "no".to_string())
            );
        }

        AnamnesisCommands::History { client } => {
            let forms = service.list_anamnesis(&client).await?;
            if forms.is_empty() {
                println!("No anamnesis forms for {}.", client);
                return Ok(());
            }

            for form in forms {
                println!(
                    "{}  {} answers  consent: {}  signed: {}",
                    form.created_at.format("%Y-%m-%d"),
                    form.answers.len(),
                    if form.consent { "yes" } else { "no" },
                    if form.is_signed() { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}

async fn run_payment_method_command(
    service: &StudioService,
    cmd: PaymentMethodCommands,
) -> Result<()> {
    match cmd {
        PaymentMethodCommands::Add {
            name,
            kind,
            fee,
            installments,
        } => {
            let kind = PaymentKind::from_str(&kind)
                .with_context(|| format!("Invalid kind '{}'. Valid: cash, pix, debit, credit", kind))?;
            let method = service
                .create_payment_method(name, kind, fee, installments)
                .await?;
            println!(
                "Added payment method: {} ({}, fee {:.2}%, up to {}x)",
                method.name,
                method.kind,
                method.fee_bps as f64 / 100.0,
                method.max_installments
            );
        }

        PaymentMethodCommands::List { all } => {
            let methods = service.list_payment_methods(all).await?;
            if methods.is_empty() {
                println!("No payment methods configured.");
                return Ok(());
            }

            println!(
                "{:<20} {:<8} {:>8} {:>6} {:<8}",
                "NAME", "KIND", "FEE", "MAX X", "STATUS"
            );
            println!("{}", "-".repeat(56));
            for method in methods {
                println!(
                    "{:<20} {:<8} {:>7.2}% {:>6} {:<8}",
                    truncate(&method.name, 20),
                    method.kind.as_str(),
                    method.fee_bps as f64 / 100.0,
                    method.max_installments,
                    if method.active { "active" } else { "inactive" }
                );
            }
        }

        PaymentMethodCommands::Deactivate { name } => {
            let method = service.deactivate_payment_method(&name).await?;
            println!("Deactivated payment method: {}", method.name);
        }
    }

    Ok(())
}

async fn run_product_command(service: &StudioService, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::Add {
            name,
            stock,
            cost,
            price,
            min_stock,
        } => {
            let cost_cents = parse_amount(&cost).context("Invalid cost. Use '15.00'")?;
            let price_cents = parse_amount(&price).context("Invalid price. Use '45.00'")?;
            let product = service
                .create_product(name, stock, cost_cents, price_cents, min_stock)
                .await?;
            println!(
                "Added product: {} ({} in stock, {} each)",
                product.name,
                product.stock_quantity,
                format_cents(product.sale_price_cents)
            );
        }

        ProductCommands::List => {
            let products = service.list_products().await?;
            if products.is_empty() {
                println!("No products registered.");
                return Ok(());
            }

            println!(
                "{:<25} {:>6} {:>10} {:>10} {:>5}",
                "NAME", "STOCK", "COST", "PRICE", "MIN"
            );
            println!("{}", "-".repeat(62));
            for product in products {
                let marker = if product.is_low_stock() { " *" } else { "" };
                println!(
                    "{:<25} {:>6} {:>10} {:>10} {:>5}{}",
                    truncate(&product.name, 25),
                    product.stock_quantity,
                    format_cents(product.cost_price_cents),
                    format_cents(product.sale_price_cents),
                    product.min_stock,
                    marker
                );
            }
        }

        ProductCommands::Restock { name, quantity } => {
            let product = service.adjust_stock(&name, quantity).await?;
            println!(
                "Stock of {} is now {}",
                product.name, product.stock_quantity
            );
        }
    }

    Ok(())
}

async fn run_transaction_command(service: &StudioService, cmd: TransactionCommands) -> Result<()> {
    match cmd {
        TransactionCommands::Income {
            amount,
            category,
            date,
            description,
            client,
            method,
        } => {
            let amount_cents = parse_amount(&amount).context("Invalid amount. Use '150.00'")?;
            let occurred_at = parse_optional_date(date)?;
            let tx = service
                .record_transaction(
                    TransactionKind::Income,
                    amount_cents,
                    category,
                    occurred_at,
                    description,
                    client.as_deref(),
                    method.as_deref(),
                )
                .await?;
            println!(
                "Recorded income: {} ({}) [{}]",
                format_cents(tx.amount_cents),
                tx.category,
                tx.id
            );
        }

        TransactionCommands::Expense {
            amount,
            category,
            date,
            description,
        } => {
            let amount_cents = parse_amount(&amount).context("Invalid amount. Use '80.00'")?;
            let occurred_at = parse_optional_date(date)?;
            let tx = service
                .record_transaction(
                    TransactionKind::Expense,
                    amount_cents,
                    category,
                    occurred_at,
                    description,
                    None,
                    None,
                )
                .await?;
            println!(
                "Recorded expense: {} ({}) [{}]",
                format_cents(tx.amount_cents),
                tx.category,
                tx.id
            );
        }

        TransactionCommands::List { from, to } => {
            let (from_date, to_date) = parse_date_range(from, to)?;
            let transactions = service.list_transactions(from_date, to_date).await?;

            if transactions.is_empty() {
                println!("No transactions in range.");
                return Ok(());
            }

            for tx in transactions {
                println!(
                    "{} {:<8} {:>12} {:<15} {}",
                    tx.occurred_at.format("%Y-%m-%d"),
                    tx.kind.as_str(),
                    format_cents(tx.amount_cents),
                    truncate(&tx.category, 15),
                    tx.description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

async fn run_comanda_command(service: &StudioService, cmd: ComandaCommands) -> Result<()> {
    match cmd {
        ComandaCommands::Open { client } => {
            let command = service.open_command(&client).await?;
            println!("Opened comanda for {} ({})", client, command.id);
        }

        ComandaCommands::AddService {
            client,
            description,
            price,
            professional,
        } => {
            let price_cents = parse_amount(&price).context("Invalid price. Use '80.00'")?;
            let command = service.find_open_command(&client).await?;
            let item = service
                .add_service_item(command.id, description, price_cents, professional.as_deref())
                .await?;
            println!(
                "Added service: {} ({})",
                item.description,
                format_cents(item.total_cents())
            );
        }

        ComandaCommands::AddProduct {
            client,
            product,
            quantity,
        } => {
            let command = service.find_open_command(&client).await?;
            let item = service.add_product_item(command.id, &product, quantity).await?;
            println!(
                "Added product: {} x{} ({})",
                item.description,
                item.quantity,
                format_cents(item.total_cents())
            );
        }

        ComandaCommands::Show { client } => {
            let command = service.find_open_command(&client).await?;
            let details = service.get_command_details(command.id).await?;

            println!(
                "Comanda for {} (opened {})",
                details.client.name,
                details.command.opened_at.format("%Y-%m-%d %H:%M")
            );
            for item in &details.items {
                println!(
                    "  {:<30} x{:<3} {:>12}",
                    truncate(&item.description, 30),
                    item.quantity,
                    format_cents(item.total_cents())
                );
            }
            println!("{}", "-".repeat(50));
            println!("  {:<34} {:>12}", "TOTAL", format_cents(details.total_cents));
        }

        ComandaCommands::Close { client, payments } => {
            let command = service.find_open_command(&client).await?;

            let mut parsed = Vec::new();
            for raw in &payments {
                let (method_name, amount) = parse_payment(raw)?;
                let method = service.get_payment_method(&method_name).await?;
                parsed.push(CommandPayment {
                    payment_method_id: method.id,
                    amount_cents: amount,
                });
            }

            let result = service.close_command(command.id, parsed).await?;
            println!(
                "Closed comanda for {}: {} in {} payment(s)",
                client,
                format_cents(result.total_cents),
                result.transactions.len()
            );
            for line in &result.payments {
                if line.fee_cents > 0 {
                    println!(
                        "  {} {} -> net {} (fee {})",
                        line.method.name,
                        format_cents(line.gross_cents),
                        format_cents(line.net_cents),
                        format_cents(line.fee_cents)
                    );
                } else {
                    println!(
                        "  {} {}",
                        line.method.name,
                        format_cents(line.gross_cents)
                    );
                }
            }
            for line in &result.commissions {
                println!(
                    "  Commission {} -> {}",
                    line.professional.name,
                    format_cents(line.amount_cents)
                );
            }
        }

        ComandaCommands::Cancel { client } => {
            let command = service.find_open_command(&client).await?;
            service.cancel_command(command.id).await?;
            println!("Cancelled comanda for {}", client);
        }
    }

    Ok(())
}

async fn run_campaign_command(service: &StudioService, cmd: CampaignCommands) -> Result<()> {
    match cmd {
        CampaignCommands::AddTemplate {
            name,
            trigger,
            body,
            hours_before,
        } => {
            let trigger = MessageTrigger::from_str(&trigger)
                .ok_or_else(|| AppError::InvalidTrigger(trigger))?;
            let body = body.unwrap_or_else(|| {
                match trigger {
                    MessageTrigger::Confirmation => DEFAULT_CONFIRMATION_BODY,
                    MessageTrigger::Reminder => DEFAULT_REMINDER_BODY,
                    MessageTrigger::Winback => DEFAULT_WINBACK_BODY,
                }
                .to_string()
            });

            let template = service
                .create_template(name, trigger, body, hours_before)
                .await?;
            println!("Added template: {} ({})", template.name, template.trigger);
        }

        CampaignCommands::Templates { all } => {
            let templates = service.list_templates(all).await?;
            if templates.is_empty() {
                println!("No templates configured.");
                return Ok(());
            }

            for template in templates {
                println!(
                    "{:<20} {:<12} {:<8} {}",
                    truncate(&template.name, 20),
                    template.trigger.as_str(),
                    if template.active { "active" } else { "inactive" },
                    truncate(&template.body, 60)
                );
            }
        }

        CampaignCommands::Deactivate { name } => {
            let template = service.deactivate_template(&name).await?;
            println!("Deactivated template: {}", template.name);
        }

        CampaignCommands::Due => {
            let due = service.due_reminders(Utc::now()).await?;
            if due.is_empty() {
                println!("No reminders due.");
                return Ok(());
            }

            for message in due {
                print_message(&message);
            }
        }

        CampaignCommands::Send => {
            let sent = service.send_due_reminders(Utc::now()).await?;
            if sent.is_empty() {
                println!("No reminders due.");
                return Ok(());
            }

            for message in &sent {
                print_message(message);
            }
            println!("Logged {} message(s).", sent.len());
        }

        CampaignCommands::Winback { days } => {
            let sent = service.send_winback(Utc::now(), days).await?;
            if sent.is_empty() {
                println!("No winback messages to send.");
                return Ok(());
            }

            for message in &sent {
                print_message(message);
            }
            println!("Logged {} message(s).", sent.len());
        }

        CampaignCommands::Confirmation { id } => {
            let message = service.render_confirmation(parse_uuid(&id)?).await?;
            print_message(&message);
        }

        CampaignCommands::Log => {
            let log = service.list_message_log().await?;
            if log.is_empty() {
                println!("Message log is empty.");
                return Ok(());
            }

            for entry in log {
                println!(
                    "{} {}",
                    entry.logged_at.format("%Y-%m-%d %H:%M"),
                    truncate(&entry.body, 70)
                );
            }
        }
    }

    Ok(())
}

fn print_message(message: &crate::application::RenderedMessage) {
    println!(
        "-> {} ({})",
        message.client_name,
        message.whatsapp.as_deref().unwrap_or("no whatsapp")
    );
    println!("   {}", message.body);
}

async fn run_report_command(service: &StudioService, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Summary { from, to, format } => {
            let (from_date, to_date) = parse_date_range(from, to)?;
            let report = service.get_summary_report(from_date, to_date).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("metric,amount");
                    println!("income,{}", report.current.income);
                    println!("expense,{}", report.current.expense);
                    println!("net,{}", report.current.net);
                    println!("previous_net,{}", report.previous.net);
                    println!("change,{}", report.change);
                }
                _ => {
                    println!("Period Summary");
                    println!(
                        "Period: {} to {}",
                        from_date.format("%Y-%m-%d"),
                        to_date.format("%Y-%m-%d")
                    );
                    println!();
                    println!("Income:   {:>15}", format_cents(report.current.income));
                    println!("Expense:  {:>15}", format_cents(report.current.expense));
                    println!("{}", "-".repeat(26));
                    println!("Net:      {:>15}", format_cents(report.current.net));
                    println!();
                    println!(
                        "Previous period net: {} ({}{:.1}%)",
                        format_cents(report.previous.net),
                        if report.change >= 0 { "+" } else { "" },
                        report.change_percentage
                    );

                    if !report.top_categories.is_empty() {
                        println!();
                        println!("Top income categories:");
                        for (i, cat) in report.top_categories.iter().take(5).enumerate() {
                            println!(
                                "  {}. {:<18} {:>12} ({:.1}%)",
                                i + 1,
                                truncate(&cat.category, 18),
                                format_cents(cat.total),
                                cat.percentage
                            );
                        }
                    }
                }
            }
        }

        ReportCommands::Daily { from, to, format } => {
            let to_day = match to {
                Some(s) => parse_naive_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let from_day = match from {
                Some(s) => parse_naive_date(&s)?,
                None => to_day - Duration::days(30),
            };
            let report = service.get_daily_report(from_day, to_day).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("day,income,expense");
                    for day in &report.days {
                        println!("{},{},{}", day.day, day.income, day.expense);
                    }
                }
                _ => {
                    println!("Daily Flow");
                    println!("Period: {} to {}", report.from_day, report.to_day);
                    println!();
                    println!("{:<12} {:>12} {:>12} {:>12}", "DAY", "INCOME", "EXPENSE", "NET");
                    println!("{}", "-".repeat(52));
                    for day in &report.days {
                        println!(
                            "{:<12} {:>12} {:>12} {:>12}",
                            day.day.to_string(),
                            format_cents(day.income),
                            format_cents(day.expense),
                            format_cents(day.income - day.expense)
                        );
                    }
                }
            }
        }

        ReportCommands::Categories { from, to, format } => {
            let (from_date, to_date) = parse_date_range(from, to)?;
            let report = service.get_category_report(from_date, to_date).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("category,total,count,percentage");
                    for cat in &report.categories {
                        println!(
                            "{},{},{},{:.2}",
                            cat.category, cat.total, cat.count, cat.percentage
                        );
                    }
                }
                _ => {
                    println!("Income by Category");
                    println!(
                        "Period: {} to {}",
                        from_date.format("%Y-%m-%d"),
                        to_date.format("%Y-%m-%d")
                    );
                    println!();
                    println!(
                        "{:<20} {:>12} {:>8} {:>8}",
                        "CATEGORY", "TOTAL", "COUNT", "PERCENT"
                    );
                    println!("{}", "-".repeat(52));
                    for cat in &report.categories {
                        println!(
                            "{:<20} {:>12} {:>8} {:>7.1}%",
                            truncate(&cat.category, 20),
                            format_cents(cat.total),
                            cat.count,
                            cat.percentage
                        );
                    }
                    println!("{}", "-".repeat(52));
                    println!("{:<20} {:>12}", "TOTAL", format_cents(report.total_income));
                }
            }
        }

        ReportCommands::TopClients { format } => {
            let report = service.get_top_clients_report().await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("rank,name,total_spent");
                    for (i, client) in report.clients.iter().enumerate() {
                        println!("{},{},{}", i + 1, client.name, client.total_spent);
                    }
                }
                _ => {
                    println!("Top Clients by Lifetime Value");
                    println!();
                    if report.clients.is_empty() {
                        println!("  (no spending clients yet)");
                    }
                    for (i, client) in report.clients.iter().enumerate() {
                        println!(
                            "  {:>2}. {:<25} {:>12}",
                            i + 1,
                            truncate(&client.name, 25),
                            format_cents(client.total_spent)
                        );
                    }
                }
            }
        }

        ReportCommands::Churn { days, format } => {
            let report = service.get_churn_report(Some(days)).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("name,whatsapp,last_appointment,days_since");
                    for client in &report.clients {
                        println!(
                            "{},{},{},{}",
                            client.name,
                            client.whatsapp.as_deref().unwrap_or(""),
                            client.last_appointment.format("%Y-%m-%d"),
                            client.days_since
                        );
                    }
                }
                _ => {
                    println!("Clients at Risk (no visit in {} days)", report.threshold_days);
                    println!();
                    if report.clients.is_empty() {
                        println!("  (none)");
                    }
                    for client in &report.clients {
                        println!(
                            "  {:<25} last visit {} ({} days ago)",
                            truncate(&client.name, 25),
                            client.last_appointment.format("%Y-%m-%d"),
                            client.days_since
                        );
                    }
                }
            }
        }

        ReportCommands::Inventory { format } => {
            let report = service.get_inventory_report().await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    println!("name,stock,min_stock");
                    for product in &report.low_stock {
                        println!(
                            "{},{},{}",
                            product.name, product.stock_quantity, product.min_stock
                        );
                    }
                }
                _ => {
                    println!("Inventory");
                    println!(
                        "Capital at risk (stock at cost): {}",
                        format_cents(report.capital_at_risk)
                    );
                    println!();
                    if report.low_stock.is_empty() {
                        println!("No products below their reorder threshold.");
                    } else {
                        println!("Low stock:");
                        for product in &report.low_stock {
                            println!(
                                "  {:<25} {} in stock (min {})",
                                truncate(&product.name, 25),
                                product.stock_quantity,
                                product.min_stock
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &StudioService,
    export_type: &str,
    output: Option<String>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let mut writer: Box<dyn std::io::Write> = match &output {
        Some(path) => Box::new(std::fs::File::create(path).context("Failed to create file")?),
        None => Box::new(std::io::stdout()),
    };

    let count = match export_type {
        "clients" => exporter.export_clients_csv(&mut writer).await?,
        "transactions" => exporter.export_transactions_csv(&mut writer).await?,
        "appointments" => exporter.export_appointments_csv(&mut writer).await?,
        "full" => {
            let snapshot = exporter.export_full_json(&mut writer).await?;
            snapshot.clients.len()
                + snapshot.appointments.len()
                + snapshot.transactions.len()
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid: clients, transactions, appointments, full",
            other
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} record(s) to {}", count, path);
    }

    Ok(())
}

async fn run_import_command(
    service: &StudioService,
    import_type: &str,
    input: Option<String>,
    options: ImportOptions,
) -> Result<()> {
    let importer = Importer::new(service);

    let reader: Box<dyn std::io::Read> = match &input {
        Some(path) => Box::new(std::fs::File::open(path).context("Failed to open file")?),
        None => Box::new(std::io::stdin()),
    };

    let result = match import_type {
        "clients" => importer.import_clients_csv(reader, options).await?,
        "transactions" => importer.import_transactions_csv(reader, options).await?,
        other => anyhow::bail!(
            "Unknown import type '{}'. Valid: clients, transactions",
            other
        ),
    };

    println!(
        "Imported: {}  Skipped: {}  Errors: {}",
        result.imported,
        result.skipped,
        result.errors.len()
    );

    for error in result.errors.iter().take(10) {
        println!(
            "  line {}: {}{}",
            error.line,
            error
                .field
                .as_ref()
                .map(|f| format!("[{}] ", f))
                .unwrap_or_default(),
            error.error
        );
    }
    if result.errors.len() > 10 {
        println!("  ... and {} more errors", result.errors.len() - 10);
    }

    Ok(())
}

// ========================
// Parsing helpers
// ========================

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).context("Invalid ID format (expected UUID)")
}

fn parse_naive_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
}

fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    Ok(parse_naive_date(s)?.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

fn parse_datetime(date: &str, time: &str) -> Result<DateTime<Utc>> {
    let day = parse_naive_date(date)?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .with_context(|| format!("Invalid time format '{}'. Use HH:MM", time))?;
    Ok(day.and_time(time).and_utc())
}

fn parse_optional_date(date: Option<String>) -> Result<DateTime<Utc>> {
    match date {
        Some(s) => parse_date(&s),
        None => Ok(Utc::now()),
    }
}

/// Resolve an optional date range: `to` defaults to now, `from` defaults to
/// 30 days before `to`.
fn parse_date_range(
    from: Option<String>,
    to: Option<String>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let to_date = match to {
        Some(s) => parse_date(&s)? + Duration::days(1),
        None => Utc::now(),
    };
    let from_date = match from {
        Some(s) => parse_date(&s)?,
        None => to_date - Duration::days(30),
    };
    Ok((from_date, to_date))
}

/// Parse "question=answer" with an optional '!' prefix flagging a
/// contraindication.
fn parse_answer(raw: &str) -> Result<AnamnesisAnswer> {
    let (flagged, raw) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (question, answer) = raw
        .split_once('=')
        .context("Answer must be 'question=answer'")?;
    Ok(AnamnesisAnswer {
        question: question.trim().to_string(),
        answer: answer.trim().to_string(),
        contraindication: flagged,
    })
}

/// Parse "method=amount" for comanda payments.
fn parse_payment(raw: &str) -> Result<(String, i64)> {
    let (method, amount) = raw
        .split_once('=')
        .context("Payment must be 'method=amount'")?;
    let amount_cents =
        parse_amount(amount.trim()).context("Invalid payment amount. Use '50.00'")?;
    Ok((method.trim().to_string(), amount_cents))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        let plain = parse_answer("Possui alergia?=Não").unwrap();
        assert_eq!(plain.question, "Possui alergia?");
        assert_eq!(plain.answer, "Não");
        assert!(!plain.contraindication);

        let flagged = parse_answer("!Está gestante?=Sim").unwrap();
        assert!(flagged.contraindication);
        assert_eq!(flagged.question, "Está gestante?");

        assert!(parse_answer("sem separador").is_err());
    }

    #[test]
    fn test_parse_payment() {
        let (method, amount) = parse_payment("pix=130.00").unwrap();
        assert_eq!(method, "pix");
        assert_eq!(amount, 13000);

        assert!(parse_payment("pix").is_err());
        assert!(parse_payment("pix=abc").is_err());
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime("2024-03-15", "14:30").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-03-15 14:30");

        assert!(parse_datetime("15/03/2024", "14:30").is_err());
        assert!(parse_datetime("2024-03-15", "2pm").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long name", 10), "a rathe...");
    }
}
