//! Plan command - show test units without scanning.

use std::path::Path;

use anyhow::Result;
use portassert_core::ports::InventorySource;
use portassert_core::{InventoryFile, PortAssertEngine, Settings, TestUnitSpec};
use serde_json::{json, Value};

pub async fn run(inventory: &Path, settings: Settings, json: bool) -> Result<()> {
    let engine = PortAssertEngine::new(&settings)?;
    let inventory = InventoryFile::new(inventory).load().await?;
    let units = engine.plan(&inventory)?;

    if json {
        let output: Vec<Value> = units.iter().map(unit_json).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if units.is_empty() {
        println!("No test units.");
        return Ok(());
    }

    println!("{:<6} {:<6} TITLE", "PLAN", "PROTO");
    println!("{}", "-".repeat(80));

    for unit in &units {
        println!("{:<6} {:<6} {}", unit.plan(), unit.protocol.tag(), unit.title());
    }

    let total: usize = units.iter().map(|u| u.plan()).sum();
    println!("\nTotal: {} units, {} assertions", units.len(), total);
    Ok(())
}

/// JSON view of a unit, including its derived title and plan size.
fn unit_json(unit: &TestUnitSpec) -> Value {
    json!({
        "title": unit.title(),
        "plan": unit.plan(),
        "group": unit.group,
        "host": unit.host,
        "protocol": unit.protocol,
        "tokens": unit.tokens,
    })
}
