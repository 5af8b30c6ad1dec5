//! PortAssert engine - wires settings, scanner and harness together.
//!
//! The engine is the entry point front-ends use: plan an inventory, or plan
//! and run it. It never terminates the process; configuration problems come
//! back as [`Error`](crate::error::Error) values for the caller to act on.

use tracing::info;

use crate::adapters::NmapScanner;
use crate::application::{Reconciler, RunReport, Runner, ScanOrchestrator};
use crate::domain::{Inventory, PlanBuilder, TestUnitSpec};
use crate::error::Result;
use crate::ports::{InventorySource, ScannerPort};
use crate::settings::Settings;

/// The main PortAssert engine.
pub struct PortAssertEngine<S: ScannerPort + 'static = NmapScanner> {
    planner: PlanBuilder,
    runner: Runner<S>,
}

impl PortAssertEngine<NmapScanner> {
    /// Create an engine backed by nmap.
    pub fn new(settings: &Settings) -> Result<Self> {
        let scanner = match &settings.nmap_path {
            Some(path) => NmapScanner::with_path(path),
            None => NmapScanner::new(),
        };
        info!(nmap = %scanner.nmap_path().display(), "using nmap");
        Self::with_scanner(settings, scanner)
    }
}

impl<S: ScannerPort + 'static> PortAssertEngine<S> {
    /// Create an engine with a custom scanner.
    pub fn with_scanner(settings: &Settings, scanner: S) -> Result<Self> {
        settings.validate()?;

        let orchestrator = ScanOrchestrator::with_timeout(scanner, settings.scan_timeout());
        Ok(Self {
            planner: PlanBuilder::new(settings.granularity),
            runner: Runner::new(Reconciler::new(orchestrator), settings.concurrency),
        })
    }

    /// Validate an inventory and return its test units without scanning.
    pub fn plan(&self, inventory: &Inventory) -> Result<Vec<TestUnitSpec>> {
        Ok(self.planner.build(inventory)?)
    }

    /// Plan and run an inventory.
    ///
    /// Fails only on configuration errors; scan problems are reported as
    /// failed assertions in the returned report.
    pub async fn run(&self, inventory: &Inventory) -> Result<RunReport> {
        let units = self.plan(inventory)?;
        Ok(self.runner.run(units).await)
    }

    /// Load an inventory from `source`, then plan and run it.
    pub async fn run_source<I: InventorySource>(&self, source: &I) -> Result<RunReport> {
        let inventory = source.load().await?;
        self.run(&inventory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::parse_inventory;
    use crate::domain::{InventoryError, ObservedPort, ScanRequest, ScanResult, UnitGranularity};
    use crate::error::Error;

    /// Every requested port is open except those above 1000.
    struct LowPortsOpen;

    impl ScannerPort for LowPortsOpen {
        async fn scan(&self, request: &ScanRequest) -> Result<Vec<ScanResult>> {
            let open = request
                .ports
                .iter()
                .filter(|&&p| p <= 1000)
                .map(|&p| ObservedPort::new(p, request.protocol))
                .collect();
            Ok(vec![ScanResult::new(request.host.clone(), open)])
        }
    }

    struct StaticInventory(&'static str);

    impl InventorySource for StaticInventory {
        async fn load(&self) -> Result<Inventory> {
            parse_inventory(self.0)
        }
    }

    const INVENTORY: &str = r#"
host:
  localhost:
    127.0.0.1: 22 80 -8080 UDP:53 -UDP:5353
kubernetes:
  deployment:
    web: 80
"#;

    #[tokio::test]
    async fn test_run_inventory() {
        let engine = PortAssertEngine::with_scanner(&Settings::default(), LowPortsOpen).unwrap();
        let report = engine.run_source(&StaticInventory(INVENTORY)).await.unwrap();

        assert_eq!(report.units.len(), 2);
        assert_eq!(
            report.units[0].title,
            "localhost 127.0.0.1 TCP:22 open,80 open,8080 closed"
        );
        assert_eq!(report.units[1].title, "localhost 127.0.0.1 UDP:53 open,5353 closed");
        assert_eq!(report.total_assertions(), 5);
        assert!(report.success());
    }

    #[tokio::test]
    async fn test_per_port_granularity() {
        let settings = Settings {
            granularity: UnitGranularity::Port,
            ..Settings::default()
        };
        let engine = PortAssertEngine::with_scanner(&settings, LowPortsOpen).unwrap();
        let inventory = parse_inventory(INVENTORY).unwrap();
        assert_eq!(engine.plan(&inventory).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_group_is_configuration_error() {
        let engine = PortAssertEngine::with_scanner(&Settings::default(), LowPortsOpen).unwrap();
        let result = engine
            .run_source(&StaticInventory("host:\n  webservers:\n    a: 80\n"))
            .await;

        match result {
            Err(err @ Error::Inventory(InventoryError::UnknownGroup { .. })) => {
                assert!(err.is_configuration())
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            concurrency: 0,
            ..Settings::default()
        };
        assert!(matches!(
            PortAssertEngine::with_scanner(&settings, LowPortsOpen),
            Err(Error::Config(_))
        ));
    }
}
