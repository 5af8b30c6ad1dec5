//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod orchestrator;
mod reconciler;
mod runner;

pub use orchestrator::{ScanOrchestrator, SCAN_TIMEOUT_MILLIS};
pub use reconciler::{Reconciler, TestUnit};
pub use runner::{RunReport, Runner};
