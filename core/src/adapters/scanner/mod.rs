//! Scanner adapters.
//!
//! `nmap` is the only backend: one process per scan request, grepable
//! output on stdout.

mod grepable;
mod options;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::domain::{ScanRequest, ScanResult};
use crate::error::{Error, Result};
use crate::ports::ScannerPort;

pub use grepable::parse_grepable;
pub use options::build_nmap_options;

/// Default paths to search for nmap.
const NMAP_PATHS: &[&str] = &[
    "/usr/bin/nmap",             // System
    "/usr/local/bin/nmap",       // Intel Mac / Homebrew / source build
    "/opt/homebrew/bin/nmap",    // Apple Silicon
];

/// Scanner backed by the `nmap` binary.
#[derive(Debug, Clone)]
pub struct NmapScanner {
    nmap_path: PathBuf,
}

impl NmapScanner {
    /// Create a scanner using the first nmap found in the default paths,
    /// falling back to `nmap` on `PATH`.
    pub fn new() -> Self {
        Self {
            nmap_path: find_executable(NMAP_PATHS).unwrap_or_else(|| PathBuf::from("nmap")),
        }
    }

    /// Create a scanner with an explicit nmap path.
    pub fn with_path(nmap_path: impl Into<PathBuf>) -> Self {
        Self {
            nmap_path: nmap_path.into(),
        }
    }

    pub fn nmap_path(&self) -> &Path {
        &self.nmap_path
    }

    async fn execute_nmap(&self, args: &[String]) -> Result<String> {
        debug!(nmap = %self.nmap_path.display(), args = %args.join(" "), "running nmap");

        // The orchestrator may drop this future on timeout; take nmap down with it.
        let output = Command::new(&self.nmap_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::CommandFailed(format!(
                    "Failed to run {}: {}",
                    self.nmap_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed(format!(
                "nmap exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in nmap output: {}", e)))
    }
}

impl Default for NmapScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerPort for NmapScanner {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<ScanResult>> {
        let args = build_nmap_options(request)?;
        let stdout = self.execute_nmap(&args).await?;
        let results = parse_grepable(&stdout)?;

        // With -Pn every resolvable target yields a Host line.
        if results.is_empty() {
            return Err(Error::HostUnreachable(request.host.clone()));
        }

        Ok(results)
    }
}

/// Finds an executable in the given paths.
fn find_executable(paths: &[&str]) -> Option<PathBuf> {
    paths.iter().map(PathBuf::from).find(|p| p.exists())
}
