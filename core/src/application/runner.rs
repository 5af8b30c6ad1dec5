//! Test harness: drives test units with bounded concurrency.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::domain::{TestUnitSpec, UnitReport};
use crate::ports::ScannerPort;

use super::reconciler::Reconciler;

/// Reports for every unit in a run, in scheduling order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn total_assertions(&self) -> usize {
        self.units.iter().map(|u| u.assertions.len()).sum()
    }

    pub fn planned_assertions(&self) -> usize {
        self.units.iter().map(|u| u.plan).sum()
    }

    pub fn failed_assertions(&self) -> usize {
        self.units.iter().map(|u| u.failures().count()).sum()
    }

    /// Units that emitted a different number of assertions than planned.
    pub fn mismatched_units(&self) -> usize {
        self.units.iter().filter(|u| u.plan_mismatch()).count()
    }

    pub fn success(&self) -> bool {
        self.units.iter().all(UnitReport::passed)
    }
}

/// Runs units independently; one unit's failure never stops another.
pub struct Runner<S: ScannerPort + 'static> {
    reconciler: Reconciler<S>,
    concurrency: usize,
}

impl<S: ScannerPort + 'static> Runner<S> {
    pub fn new(reconciler: Reconciler<S>, concurrency: usize) -> Self {
        Self {
            reconciler,
            concurrency: concurrency.max(1),
        }
    }

    /// Run all units, with at most `concurrency` scans in flight.
    pub async fn run(&self, units: Vec<TestUnitSpec>) -> RunReport {
        let total = units.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        info!(units = total, concurrency = self.concurrency, "starting run");

        for (index, spec) in units.into_iter().enumerate() {
            // The semaphore is never closed.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let unit = self.reconciler.start(spec);
            tasks.spawn(async move {
                let _permit = permit;
                (index, unit.finish().await)
            });
        }

        let mut reports: Vec<(usize, UnitReport)> = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(e) => error!(error = %e, "test unit task failed"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);

        let report = RunReport {
            units: reports.into_iter().map(|(_, r)| r).collect(),
        };
        info!(
            units = report.units.len(),
            assertions = report.total_assertions(),
            failed = report.failed_assertions(),
            "run finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ScanOrchestrator;
    use crate::domain::{ObservedPort, Protocol, ScanRequest, ScanResult};
    use crate::error::{Error, Result};
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Answers per host; tracks how many scans run at once.
    #[derive(Default)]
    struct FleetScanner {
        in_flight: Mutex<usize>,
        peak: Arc<Mutex<usize>>,
    }

    impl ScannerPort for FleetScanner {
        async fn scan(&self, request: &ScanRequest) -> Result<Vec<ScanResult>> {
            {
                let mut in_flight = self.in_flight.lock();
                *in_flight += 1;
                let mut peak = self.peak.lock();
                *peak = (*peak).max(*in_flight);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            *self.in_flight.lock() -= 1;

            match request.host.as_str() {
                "down" => Err(Error::HostUnreachable("down".to_string())),
                host => Ok(vec![ScanResult::new(
                    host,
                    vec![ObservedPort::new(22, request.protocol)],
                )]),
            }
        }
    }

    fn units(hosts: &[&str]) -> Vec<TestUnitSpec> {
        hosts
            .iter()
            .map(|h| TestUnitSpec::new("_fleet", *h, Protocol::Tcp, vec!["22".into(), "-80".into()]))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_order_and_isolates_failures() {
        let runner = Runner::new(
            Reconciler::new(ScanOrchestrator::new(FleetScanner::default())),
            4,
        );

        let report = runner.run(units(&["a", "down", "b"])).await;

        assert_eq!(report.units.len(), 3);
        assert_eq!(report.units[0].title, "_fleet a TCP:22 open,80 closed");
        assert!(report.units[0].passed());
        assert!(!report.units[1].passed());
        assert!(report.units[2].passed());

        assert_eq!(report.planned_assertions(), 6);
        assert_eq!(report.total_assertions(), 5);
        assert_eq!(report.failed_assertions(), 1);
        assert_eq!(report.mismatched_units(), 1);
        assert!(!report.success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_bounds_concurrency() {
        let peak = Arc::new(Mutex::new(0));
        let scanner = FleetScanner {
            in_flight: Mutex::new(0),
            peak: peak.clone(),
        };
        let runner = Runner::new(Reconciler::new(ScanOrchestrator::new(scanner)), 2);

        let report = runner.run(units(&["a", "b", "c", "d", "e"])).await;

        assert!(report.success());
        assert!(*peak.lock() <= 2);
    }

    #[tokio::test]
    async fn test_empty_run_succeeds() {
        let runner = Runner::new(
            Reconciler::new(ScanOrchestrator::new(FleetScanner::default())),
            1,
        );
        let report = runner.run(Vec::new()).await;
        assert!(report.units.is_empty());
        assert!(report.success());
    }
}
