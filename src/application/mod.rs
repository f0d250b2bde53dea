// Application layer - orchestration over the repository plus the report
// shapes the CLI renders. Pure calculations live in `domain`; this layer
// fetches rows, applies them, and persists results.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
