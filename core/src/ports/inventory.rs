//! Inventory source port (interface).

use crate::domain::Inventory;
use crate::error::Result;

/// Port for loading the host/port inventory.
pub trait InventorySource: Send + Sync {
    /// Load and structurally parse the inventory.
    ///
    /// Semantic validation (test types, group names, expressions) happens
    /// during planning.
    fn load(&self) -> impl std::future::Future<Output = Result<Inventory>> + Send;
}
