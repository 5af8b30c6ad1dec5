//! Config command - show effective settings.

use anyhow::Result;
use portassert_core::Settings;

pub fn show(settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let nmap = settings
        .nmap_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(auto)".to_string());

    println!("nmap:         {}", nmap);
    println!("scan timeout: {}ms", settings.scan_timeout_millis);
    println!("concurrency:  {}", settings.concurrency);
    println!("granularity:  {:?}", settings.granularity);
    Ok(())
}
