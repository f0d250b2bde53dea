mod repository;

pub use repository::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for anamnesis forms
pub const MIGRATION_002_ANAMNESIS: &str = include_str!("migrations/002_anamnesis.sql");

/// SQL migration for comandas
pub const MIGRATION_003_COMMANDS: &str = include_str!("migrations/003_commands.sql");

/// SQL migration for message campaigns
pub const MIGRATION_004_CAMPAIGNS: &str = include_str!("migrations/004_campaigns.sql");
