//! Example: Check a handful of ports on one host.
//!
//! Usage: cargo run -p portassert-core --example check_host -- 127.0.0.1 "22 -23 UDP:53"

use portassert_core::domain::{Group, PortSpec, Section};
use portassert_core::{Inventory, PortAssertEngine, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> portassert_core::Result<()> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let ports = args.next().unwrap_or_else(|| "22 80 -23".to_string());

    let inventory = Inventory::new(vec![Section {
        test_type: "host".to_string(),
        groups: vec![Group {
            name: "localhost".to_string(),
            hosts: vec![(host.clone(), PortSpec::Tokens(ports))],
        }],
    }]);

    let engine = PortAssertEngine::new(&Settings::default())?;
    let units = engine.plan(&inventory)?;
    println!("Checking {} unit(s) on {}...\n", units.len(), host);

    let report = engine.run(&inventory).await?;

    for unit in &report.units {
        println!("{}", unit.title);
        for assertion in &unit.assertions {
            let mark = if assertion.passed { "PASS" } else { "FAIL" };
            println!("  {:<4} {}", mark, assertion.message);
        }
        if unit.plan_mismatch() {
            println!("  planned {}, got {}", unit.plan, unit.assertions.len());
        }
    }

    if report.success() {
        println!("\nAll checks passed.");
    } else {
        println!("\nSome checks failed.");
    }
    Ok(())
}
