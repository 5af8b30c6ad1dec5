//! nmap command-line construction.

use crate::domain::{Protocol, ScanRequest};
use crate::error::{Error, Result};

/// Build the nmap argument vector for a request.
///
/// Output goes to stdout in grepable form (`-oG -`). Host discovery is
/// skipped (`-Pn`) so every requested port gets a verdict, and reverse DNS
/// is disabled (`-n`) so the reported address is stable.
///
/// Only TCP and UDP port scans are supported. An empty port list is
/// rejected; nmap would otherwise fall back to its default top ports.
pub fn build_nmap_options(request: &ScanRequest) -> Result<Vec<String>> {
    let scan_type = match request.protocol {
        Protocol::Tcp => "-sT",
        Protocol::Udp => "-sU",
        Protocol::Icmp => {
            return Err(Error::UnsupportedProtocol(request.protocol.to_string()))
        }
    };

    if request.ports.is_empty() {
        return Err(Error::CommandFailed(format!(
            "No ports to scan on {}",
            request.host
        )));
    }

    let mut args: Vec<String> = ["-Pn", "-n", scan_type].map(String::from).to_vec();
    args.push("-p".to_string());
    args.push(request.port_list());

    args.push("--host-timeout".to_string());
    args.push(format!("{}ms", request.timeout.as_millis().max(1)));

    args.push("-oG".to_string());
    args.push("-".to_string());
    args.push(request.host.clone());

    Ok(args)
}
