mod analytics;
mod anamnesis;
mod appointment;
mod campaign;
mod client;
mod command;
mod contract;
mod money;
mod payment_method;
mod product;
mod professional;
mod transaction;

pub use analytics::*;
pub use anamnesis::*;
pub use appointment::*;
pub use campaign::*;
pub use client::*;
pub use command::*;
pub use contract::*;
pub use money::*;
pub use payment_method::*;
pub use product::*;
pub use professional::*;
pub use transaction::*;
