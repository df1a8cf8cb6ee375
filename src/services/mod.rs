//! Service layer for doblock business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services report progress through events and can be driven by the CLI or
//! any other front end.

pub mod processing;
pub mod protection;

pub use processing::{DobLookupError, ExtractionService, ProcessingEvent};
pub use protection::{protect_all, ProtectSummary, ProtectionEvent};
