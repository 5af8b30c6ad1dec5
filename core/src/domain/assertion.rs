//! Assertion outcomes and per-unit reports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an assertion checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    /// A port was expected open or closed.
    Expectation,
    /// The scan itself failed (timeout, unreachable host, tool error).
    ScanFailure,
    /// The scanner returned data that contradicts its contract.
    Consistency,
}

/// A single pass/fail check emitted by a test unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub passed: bool,
    pub kind: AssertionKind,
    pub message: String,
}

impl Assertion {
    pub fn expectation(passed: bool, message: impl Into<String>) -> Self {
        Self {
            passed,
            kind: AssertionKind::Expectation,
            message: message.into(),
        }
    }

    pub fn failure(kind: AssertionKind, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            kind,
            message: message.into(),
        }
    }
}

/// Everything one test unit declared and emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: Uuid,
    pub title: String,
    /// Assertion count declared before the scan started.
    pub plan: usize,
    pub assertions: Vec<Assertion>,
}

impl UnitReport {
    /// Failed assertions, in emission order.
    pub fn failures(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter().filter(|a| !a.passed)
    }

    /// The unit emitted a different number of assertions than it planned.
    pub fn plan_mismatch(&self) -> bool {
        self.assertions.len() != self.plan
    }

    pub fn passed(&self) -> bool {
        !self.plan_mismatch() && self.assertions.iter().all(|a| a.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(plan: usize, assertions: Vec<Assertion>) -> UnitReport {
        UnitReport {
            id: Uuid::new_v4(),
            title: "localhost 127.0.0.1 TCP:80 open".to_string(),
            plan,
            assertions,
        }
    }

    #[test]
    fn test_empty_unit_passes() {
        let report = report(0, vec![]);
        assert!(report.passed());
        assert!(!report.plan_mismatch());
    }

    #[test]
    fn test_plan_mismatch_fails_unit() {
        let report = report(2, vec![Assertion::expectation(true, "ok")]);
        assert!(report.plan_mismatch());
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_failures() {
        let report = report(
            2,
            vec![
                Assertion::expectation(true, "open"),
                Assertion::expectation(false, "closed"),
            ],
        );
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
    }
}
