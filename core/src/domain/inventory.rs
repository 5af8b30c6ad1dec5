//! Host/port inventory model.
//!
//! An inventory is an ordered, three level mapping:
//! test type (`host`, `instance`, `k8s`, `kubernetes`) -> group
//! (`localhost` or any name starting with `_`) -> host -> port spec.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ExpressionError;

/// Errors in the structure or content of an inventory.
///
/// All of these are fatal for a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("unknown test type `{0}`")]
    UnknownTestType(String),

    #[error("unknown group `{group}` under `{test_type}` (expected `localhost` or a name starting with `_`)")]
    UnknownGroup { test_type: String, group: String },

    #[error("invalid port expression `{token}` for host `{host}`: {source}")]
    InvalidExpression {
        host: String,
        token: String,
        #[source]
        source: ExpressionError,
    },

    #[error("malformed inventory: {0}")]
    Malformed(String),
}

/// Kind of test a top-level inventory section declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// `host` / `instance`: scan hosts directly.
    Host,
    /// `k8s` / `kubernetes`: recognized, not implemented.
    Kubernetes,
}

impl TestType {
    pub fn from_key(key: &str) -> Result<Self, InventoryError> {
        match key {
            "host" | "instance" => Ok(TestType::Host),
            "k8s" | "kubernetes" => Ok(TestType::Kubernetes),
            other => Err(InventoryError::UnknownTestType(other.to_string())),
        }
    }
}

/// Whether a group key is accepted under a host section.
pub fn is_valid_group_name(name: &str) -> bool {
    name == "localhost" || name.starts_with('_')
}

/// Port declaration for a host, as written in the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    /// One token or several space-delimited tokens.
    Tokens(String),
    List(Vec<PortSpec>),
    /// Nested sub-host mapping, in document order.
    Nested(Vec<(String, PortSpec)>),
}

impl PortSpec {
    pub fn empty() -> Self {
        PortSpec::List(Vec::new())
    }
}

/// A group of hosts inside a test-type section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// Host identifier (possibly space-separated hosts) to its ports.
    pub hosts: Vec<(String, PortSpec)>,
}

/// A top-level test-type section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub test_type: String,
    pub groups: Vec<Group>,
}

/// A parsed inventory. Nothing is validated until planning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub sections: Vec<Section>,
}

impl Inventory {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
