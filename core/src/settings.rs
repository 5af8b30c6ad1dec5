//! Run settings.
//!
//! Stored as JSON at `~/.portassert/settings.json` by default. A missing
//! file means defaults; command-line flags override individual fields.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::application::SCAN_TIMEOUT_MILLIS;
use crate::domain::UnitGranularity;
use crate::error::{Error, Result};

/// Settings for a portassert run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Explicit nmap binary. When unset, well-known paths and `PATH` are searched.
    #[serde(default)]
    pub nmap_path: Option<PathBuf>,

    /// Upper bound for a single scan, in milliseconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_millis: u64,

    /// Maximum number of test units scanning at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// One unit per protocol bucket, or one per port expression.
    #[serde(default)]
    pub granularity: UnitGranularity,
}

fn default_scan_timeout() -> u64 {
    SCAN_TIMEOUT_MILLIS
}

fn default_concurrency() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nmap_path: None,
            scan_timeout_millis: default_scan_timeout(),
            concurrency: default_concurrency(),
            granularity: UnitGranularity::default(),
        }
    }
}

impl Settings {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_millis)
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.scan_timeout_millis == 0 {
            return Err(Error::Config("scanTimeoutMillis must be greater than 0".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Settings store backed by a JSON file.
pub struct SettingsStore {
    /// Path to the settings file.
    settings_path: PathBuf,
}

impl SettingsStore {
    /// Create a store with the default path.
    ///
    /// Default path: `~/.portassert/settings.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            settings_path: home.join(".portassert").join("settings.json"),
        })
    }

    /// Create a store with a custom path.
    pub fn with_path(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk.
    ///
    /// Returns defaults if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !fs::try_exists(&self.settings_path).await.unwrap_or(false) {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }
}
