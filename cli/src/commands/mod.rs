//! Subcommand implementations.

pub mod config;
pub mod plan;
pub mod run;

use std::path::Path;

use anyhow::Result;
use clap::Args;
use portassert_core::{Settings, SettingsStore, UnitGranularity};

/// Command-line overrides for file settings.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Maximum number of hosts scanned at once
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Scan timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// One test unit per port expression instead of per protocol
    #[arg(long)]
    per_port: bool,

    /// Path to the nmap binary
    #[arg(long, value_name = "PATH")]
    nmap: Option<std::path::PathBuf>,
}

impl Overrides {
    pub fn apply(self, mut settings: Settings) -> Settings {
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            settings.scan_timeout_millis = timeout;
        }
        if self.per_port {
            settings.granularity = UnitGranularity::Port;
        }
        if let Some(nmap) = self.nmap {
            settings.nmap_path = Some(nmap);
        }
        settings
    }
}

/// Load settings from an explicit path or the default location.
pub async fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let store = match path {
        Some(path) => SettingsStore::with_path(path.to_path_buf()),
        None => SettingsStore::new()?,
    };
    Ok(store.load().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let overrides = Overrides {
            concurrency: Some(2),
            timeout: Some(1500),
            per_port: true,
            nmap: None,
        };
        let settings = overrides.apply(Settings::default());
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.scan_timeout_millis, 1500);
        assert_eq!(settings.granularity, UnitGranularity::Port);
        assert!(settings.nmap_path.is_none());
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let settings = Overrides::default().apply(Settings::default());
        assert_eq!(settings, Settings::default());
    }
}
