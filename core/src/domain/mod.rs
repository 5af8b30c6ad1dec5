//! Domain layer - Pure business logic and data models.
//!
//! This module contains the port expression grammar, the inventory model,
//! test planning, and scan/assertion data. None of it performs I/O.

pub mod assertion;
pub mod expression;
pub mod inventory;
pub mod plan;
pub mod scan;

// Re-export all domain types
pub use assertion::{Assertion, AssertionKind, UnitReport};
pub use expression::{
    bucket_of, icmp_only, is_negation, replace_negation_operator, strip_protocol, tcp_only,
    udp_only, ExpressionError, PortExpression, PortState, Protocol, DEFAULT_PROTOCOL,
};
pub use inventory::{Group, Inventory, InventoryError, PortSpec, Section, TestType};
pub use plan::{find_local_ports_to_test, PlanBuilder, TestUnitSpec, UnitGranularity};
pub use scan::{ObservedPort, ScanRequest, ScanResult};
