//! PortAssert Core Library
//!
//! Declare which ports on which hosts must be open (or closed) and check
//! the declaration against live scans.
//! Provides functionality to:
//! - Parse port expressions such as `80`, `TCP:443` or `-UDP:53`
//! - Turn a host/port inventory into test units with a fixed assertion plan
//! - Scan each unit once through nmap, bounded by a timeout
//! - Reconcile observed open ports against expectations
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod engine;
pub mod error;
pub mod settings;

// Re-export domain types (primary API)
pub use domain::{
    Assertion, AssertionKind, Inventory, InventoryError, PortExpression, PortState, Protocol,
    TestUnitSpec, UnitGranularity, UnitReport,
};

// Re-export other commonly used types
pub use adapters::{InventoryFile, NmapScanner};
pub use application::{RunReport, TestUnit, SCAN_TIMEOUT_MILLIS};
pub use engine::PortAssertEngine;
pub use error::{Error, Result};
pub use settings::{Settings, SettingsStore};
