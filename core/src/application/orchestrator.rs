//! Scan orchestration: one bounded scanner call per request.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error};

use crate::domain::{Protocol, ScanRequest, ScanResult};
use crate::error::{Error, Result};
use crate::ports::ScannerPort;

/// Default upper bound for a single scan, in milliseconds.
pub const SCAN_TIMEOUT_MILLIS: u64 = 30_000;

/// Issues scans through a [`ScannerPort`], each bounded by a fixed timeout.
///
/// There is no retry and no caching: every call is exactly one probe.
pub struct ScanOrchestrator<S: ScannerPort> {
    scanner: S,
    timeout: Duration,
}

impl<S: ScannerPort> ScanOrchestrator<S> {
    /// Create an orchestrator with the default timeout.
    pub fn new(scanner: S) -> Self {
        Self::with_timeout(scanner, Duration::from_millis(SCAN_TIMEOUT_MILLIS))
    }

    pub fn with_timeout(scanner: S, timeout: Duration) -> Self {
        Self { scanner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Scan `ports` on `host` under `protocol`.
    ///
    /// Returns the scanner's results, or an error if the scan failed or did
    /// not finish within the timeout.
    pub async fn scan(
        &self,
        host: &str,
        ports: &[u16],
        protocol: Protocol,
    ) -> Result<Vec<ScanResult>> {
        let request = ScanRequest {
            host: host.to_string(),
            ports: ports.to_vec(),
            protocol,
            timeout: self.timeout,
        };
        debug!(%host, %protocol, ports = %request.port_list(), "scanning");

        let result = match timeout(self.timeout, self.scanner.scan(&request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ScanTimeout {
                host: host.to_string(),
                millis: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(results) => debug!(%host, %protocol, hosts = results.len(), "scan finished"),
            Err(e) => error!(%host, %protocol, error = %e, "scan failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservedPort;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records requests and answers with canned results.
    struct RecordingScanner {
        requests: Arc<Mutex<Vec<ScanRequest>>>,
        delay: Duration,
    }

    impl ScannerPort for RecordingScanner {
        async fn scan(&self, request: &ScanRequest) -> Result<Vec<ScanResult>> {
            self.requests.lock().push(request.clone());
            tokio::time::sleep(self.delay).await;
            Ok(vec![ScanResult::new(
                request.host.clone(),
                vec![ObservedPort::new(80, request.protocol)],
            )])
        }
    }

    #[tokio::test]
    async fn test_scan_issues_one_request() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = ScanOrchestrator::new(RecordingScanner {
            requests: requests.clone(),
            delay: Duration::ZERO,
        });

        let results = tokio_test::assert_ok!(
            orchestrator
                .scan("10.0.0.1", &[80, 443], Protocol::Udp)
                .await
        );

        assert_eq!(results.len(), 1);
        let requests = requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].host, "10.0.0.1");
        assert_eq!(requests[0].ports, vec![80, 443]);
        assert_eq!(requests[0].protocol, Protocol::Udp);
        assert_eq!(requests[0].timeout, Duration::from_millis(SCAN_TIMEOUT_MILLIS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_times_out() {
        let orchestrator = ScanOrchestrator::with_timeout(
            RecordingScanner {
                requests: Arc::new(Mutex::new(Vec::new())),
                delay: Duration::from_secs(60),
            },
            Duration::from_millis(500),
        );

        let result = orchestrator.scan("10.0.0.1", &[22], Protocol::Tcp).await;
        match result {
            Err(Error::ScanTimeout { host, millis }) => {
                assert_eq!(host, "10.0.0.1");
                assert_eq!(millis, 500);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
