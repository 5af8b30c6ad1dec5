//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod inventory;
pub mod scanner;

// Re-export main types for convenience
pub use inventory::{parse_inventory, InventoryFile};
pub use scanner::NmapScanner;
