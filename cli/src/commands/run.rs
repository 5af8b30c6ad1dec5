//! Run command - scan hosts and report assertions.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use portassert_core::{InventoryFile, PortAssertEngine, RunReport, Settings};
use serde_json::json;

use crate::tap;

pub async fn run(inventory: &Path, settings: Settings, json: bool) -> Result<ExitCode> {
    let engine = PortAssertEngine::new(&settings)?;
    let started_at = Local::now();

    let report = engine.run_source(&InventoryFile::new(inventory)).await?;

    if json {
        let output = json!({
            "startedAt": started_at.to_rfc3339(),
            "success": report.success(),
            "units": report.units,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", tap::render(&report, &started_at.to_rfc3339()));
    }

    Ok(ExitCode::from(exit_status(&report)))
}

/// 0 when every unit met its plan and passed, 1 otherwise.
pub fn exit_status(report: &RunReport) -> u8 {
    if report.success() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portassert_core::{Assertion, AssertionKind, UnitReport};
    use uuid::Uuid;

    fn unit(plan: usize, assertions: Vec<Assertion>) -> UnitReport {
        UnitReport {
            id: Uuid::new_v4(),
            title: "localhost 127.0.0.1 TCP:22 open".to_string(),
            plan,
            assertions,
        }
    }

    #[test]
    fn test_passing_run_exits_zero() {
        let report = RunReport {
            units: vec![unit(1, vec![Assertion::expectation(true, "ok")])],
        };
        assert_eq!(exit_status(&report), 0);
        assert_eq!(exit_status(&RunReport::default()), 0);
    }

    #[test]
    fn test_failed_assertion_exits_one() {
        let report = RunReport {
            units: vec![
                unit(1, vec![Assertion::expectation(true, "ok")]),
                unit(1, vec![Assertion::expectation(false, "closed")]),
            ],
        };
        assert_eq!(exit_status(&report), 1);
    }

    #[test]
    fn test_plan_mismatch_exits_one() {
        let report = RunReport {
            units: vec![unit(
                3,
                vec![Assertion::failure(AssertionKind::ScanFailure, "unreachable")],
            )],
        };
        assert_eq!(exit_status(&report), 1);
    }
}
