//! TAP (Test Anything Protocol) rendering of run reports.

use std::fmt::Write;

use portassert_core::RunReport;

/// Render a report as TAP version 13.
///
/// Assertions are numbered across the whole run. Each unit gets a comment
/// header with its title, and a diagnostic when it emitted fewer or more
/// assertions than it planned.
pub fn render(report: &RunReport, started_at: &str) -> String {
    let mut out = String::new();
    let mut number = 0;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "TAP version 13");
    let _ = writeln!(out, "# portassert run started {}", started_at);

    for unit in &report.units {
        let _ = writeln!(out, "# {}", unit.title);
        for assertion in &unit.assertions {
            number += 1;
            let status = if assertion.passed { "ok" } else { "not ok" };
            let _ = writeln!(out, "{} {} - {}", status, number, assertion.message);
        }
        if unit.plan_mismatch() {
            let _ = writeln!(
                out,
                "# plan mismatch: planned {} assertions, got {}",
                unit.plan,
                unit.assertions.len()
            );
        }
    }

    let _ = writeln!(out, "1..{}", number);
    let _ = writeln!(out, "# tests {}", number);
    let _ = writeln!(out, "# pass  {}", number - report.failed_assertions());
    let _ = writeln!(out, "# fail  {}", report.failed_assertions());
    if report.mismatched_units() > 0 {
        let _ = writeln!(out, "# plan mismatches {}", report.mismatched_units());
    }
    out
}
