//! Error types for the portassert-core library.

use thiserror::Error;

use crate::domain::{ExpressionError, InventoryError};

/// Result type alias for portassert operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading inventories and scanning hosts.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute the scanner command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// The scan did not finish in time.
    #[error("Scan of {host} timed out after {millis}ms")]
    ScanTimeout { host: String, millis: u64 },

    /// nmap gave up on the host before finishing (`--host-timeout`).
    #[error("nmap host timeout for {0}")]
    HostTimeout(String),

    /// The scanner produced no result for the host.
    #[error("Host unreachable or unresolvable: {0}")]
    HostUnreachable(String),

    /// The scanner cannot probe this protocol.
    #[error("Unsupported scan protocol: {0}")]
    UnsupportedProtocol(String),

    /// Invalid inventory structure or content.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Invalid port expression.
    #[error("Invalid port expression: {0}")]
    Expression(#[from] ExpressionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Errors that should abort the whole run rather than a single unit.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Inventory(_) | Error::Expression(_) | Error::Yaml(_) | Error::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(Error::Inventory(InventoryError::UnknownTestType("x".into())).is_configuration());
        assert!(Error::Config("bad".into()).is_configuration());
        assert!(!Error::HostUnreachable("10.0.0.1".into()).is_configuration());
        assert!(!Error::HostTimeout("10.0.0.1".into()).is_configuration());
        assert!(!Error::ScanTimeout {
            host: "h".into(),
            millis: 10
        }
        .is_configuration());
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::ScanTimeout {
            host: "db".into(),
            millis: 30000,
        };
        assert_eq!(err.to_string(), "Scan of db timed out after 30000ms");
    }
}
