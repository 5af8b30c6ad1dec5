//! Scan requests and observed scanner results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Protocol;

/// One probe request: a single host, a list of ports, one protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub host: String,
    pub ports: Vec<u16>,
    pub protocol: Protocol,
    /// Upper bound for the whole scan.
    pub timeout: Duration,
}

impl ScanRequest {
    /// Comma-separated port list (e.g. `22,80,443`).
    pub fn port_list(&self) -> String {
        self.ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// An open port discovered on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedPort {
    pub port: u16,
    pub protocol: Protocol,
}

impl ObservedPort {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl fmt::Display for ObservedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// All open ports the scanner reported for one host in one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub host: String,
    #[serde(default)]
    pub open_ports: Vec<ObservedPort>,
}

impl ScanResult {
    pub fn new(host: impl Into<String>, open_ports: Vec<ObservedPort>) -> Self {
        Self {
            host: host.into(),
            open_ports,
        }
    }
}
