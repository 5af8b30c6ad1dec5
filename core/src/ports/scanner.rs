//! Scanner port (interface).

use crate::domain::{ScanRequest, ScanResult};
use crate::error::Result;

/// Port for probing a host's ports.
///
/// Implementations issue exactly one probe per call and never retry.
/// A single-host request is expected to yield exactly one [`ScanResult`];
/// callers treat anything else as a contract violation.
pub trait ScannerPort: Send + Sync {
    /// Scan `request.ports` on `request.host` under `request.protocol`.
    fn scan(
        &self,
        request: &ScanRequest,
    ) -> impl std::future::Future<Output = Result<Vec<ScanResult>>> + Send;
}
