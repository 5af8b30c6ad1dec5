//! Reconciliation of observed open ports against declared expectations.
//!
//! [`Reconciler::start`] fixes a unit's assertion plan synchronously, then
//! runs the scan on a spawned task. Outcomes flow back through a channel;
//! the channel closing is the unit's completion signal.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::expression::parse_port;
use crate::domain::{
    is_negation, replace_negation_operator, strip_protocol, Assertion, AssertionKind, PortState,
    Protocol, TestUnitSpec, UnitReport,
};
use crate::ports::ScannerPort;

use super::orchestrator::ScanOrchestrator;

/// A running test unit.
///
/// The plan is known as soon as the unit exists; assertions arrive lazily
/// as the scan completes.
#[derive(Debug)]
pub struct TestUnit {
    id: Uuid,
    title: String,
    plan: usize,
    outcomes: mpsc::UnboundedReceiver<Assertion>,
    received: Vec<Assertion>,
}

impl TestUnit {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of assertions this unit declared before scanning.
    pub fn plan(&self) -> usize {
        self.plan
    }

    /// Next assertion, or `None` once the unit has completed.
    pub async fn next(&mut self) -> Option<Assertion> {
        let assertion = self.outcomes.recv().await?;
        self.received.push(assertion.clone());
        Some(assertion)
    }

    /// Wait for completion and return everything the unit emitted.
    pub async fn finish(mut self) -> UnitReport {
        while self.next().await.is_some() {}
        UnitReport {
            id: self.id,
            title: self.title,
            plan: self.plan,
            assertions: self.received,
        }
    }
}

/// One expected port: the token with its protocol stripped, parsed.
#[derive(Debug, Clone)]
struct Expectation {
    /// Token with protocol removed, negation kept (e.g. `-53`).
    expected: String,
    state: PortState,
    port: Option<u16>,
}

impl Expectation {
    fn from_token(token: &str) -> Self {
        let expected = strip_protocol(token);
        let state = if is_negation(&expected) {
            PortState::Closed
        } else {
            PortState::Open
        };
        let port = parse_port(replace_negation_operator(&expected)).ok();
        Self {
            expected,
            state,
            port,
        }
    }
}

/// Turns test unit specs into running [`TestUnit`]s.
pub struct Reconciler<S: ScannerPort + 'static> {
    orchestrator: Arc<ScanOrchestrator<S>>,
}

impl<S: ScannerPort + 'static> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<S: ScannerPort + 'static> Reconciler<S> {
    pub fn new(orchestrator: ScanOrchestrator<S>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Start a unit. Must be called from within a tokio runtime.
    ///
    /// The returned unit's plan is `hosts x tokens`. Only the first host is
    /// scanned, so a multi-host unit completes short of its plan.
    pub fn start(&self, spec: TestUnitSpec) -> TestUnit {
        let id = Uuid::new_v4();
        let title = spec.title();
        let hosts = spec.hosts();
        let (tx, outcomes) = mpsc::unbounded_channel();

        let plan = match hosts.first() {
            Some(host) if !spec.tokens.is_empty() => {
                let expectations: Vec<Expectation> =
                    spec.tokens.iter().map(|t| Expectation::from_token(t)).collect();
                let plan = hosts.len() * expectations.len();
                debug!(%id, %title, plan, "unit planned");

                if hosts.len() > 1 {
                    warn!(%id, host = %spec.host, "only 1 of {} hosts will be scanned", hosts.len());
                }

                let orchestrator = Arc::clone(&self.orchestrator);
                let host = host.clone();
                let protocol = spec.protocol;
                tokio::spawn(async move {
                    reconcile(&orchestrator, &host, protocol, &expectations, &tx).await;
                });
                plan
            }
            // Nothing to check: zero assertions, already complete.
            _ => {
                drop(tx);
                0
            }
        };

        TestUnit {
            id,
            title,
            plan,
            outcomes,
            received: Vec::new(),
        }
    }
}

/// Scan one host and emit one assertion per expectation.
async fn reconcile<S: ScannerPort>(
    orchestrator: &ScanOrchestrator<S>,
    host: &str,
    protocol: Protocol,
    expectations: &[Expectation],
    tx: &mpsc::UnboundedSender<Assertion>,
) {
    // A receiver dropped early means nobody is listening; stop quietly.
    let emit = |assertion: Assertion| tx.send(assertion).is_ok();

    let ports: Vec<u16> = expectations.iter().filter_map(|e| e.port).collect();

    // Nothing valid to probe: report the bad tokens without scanning.
    if ports.is_empty() {
        for expectation in expectations {
            if !emit(invalid_expression(host, expectation)) {
                return;
            }
        }
        return;
    }

    let results = match orchestrator.scan(host, &ports, protocol).await {
        Ok(results) => results,
        Err(e) => {
            emit(Assertion::failure(AssertionKind::ScanFailure, e.to_string()));
            return;
        }
    };

    if results.len() > 1 {
        emit(Assertion::failure(
            AssertionKind::Consistency,
            format!(
                "Only one host supported per scan, found {}",
                results.len()
            ),
        ));
    }

    let mut found = BTreeSet::new();
    if let Some(result) = results.first() {
        for open in &result.open_ports {
            if open.protocol != protocol {
                emit(Assertion::failure(
                    AssertionKind::Consistency,
                    format!("protocol mismatch: {} != {}", open.protocol, protocol),
                ));
                continue;
            }
            debug!(%host, port = open.port, %protocol, "open port");
            found.insert(open.port);
        }
    }

    let found_list = found
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",");

    for expectation in expectations {
        let assertion = match expectation.port {
            Some(port) => {
                let is_open = found.contains(&port);
                let passed = match expectation.state {
                    PortState::Open => is_open,
                    PortState::Closed => !is_open,
                };
                Assertion::expectation(
                    passed,
                    format!(
                        "{}: expected {}:{} to be {}, found [{}]",
                        host, protocol, port, expectation.state, found_list
                    ),
                )
            }
            None => invalid_expression(host, expectation),
        };
        if !emit(assertion) {
            return;
        }
    }
}

fn invalid_expression(host: &str, expectation: &Expectation) -> Assertion {
    Assertion::failure(
        AssertionKind::Expectation,
        format!(
            "{}: invalid port expression `{}`",
            host, expectation.expected
        ),
    )
}
