//! Parser for nmap grepable output (`-oG`).
//!
//! Relevant lines look like:
//!
//! ```text
//! Host: 127.0.0.1 (localhost)	Status: Up
//! Host: 127.0.0.1 (localhost)	Ports: 22/open/tcp//ssh///, 80/closed/tcp//http///
//! ```
//!
//! Every `Host:` line contributes to that host's result; only ports in the
//! exact `open` state are reported. `open|filtered` is not open.
//!
//! A host nmap reports as `Down` or `Timeout` was never actually scanned,
//! so it is an error rather than a result with no open ports.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{ObservedPort, Protocol, ScanResult};
use crate::error::{Error, Result};

static HOST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Host:\s+(\S+)\s+\(([^)]*)\)").expect("valid host regex"));

static PORT_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)/([^/]*)/([^/]*)/").expect("valid port entry regex")
});

/// Parse grepable output into per-host results, in order of appearance.
pub fn parse_grepable(output: &str) -> Result<Vec<ScanResult>> {
    let mut results: Vec<ScanResult> = Vec::new();

    for line in output.lines() {
        let Some(caps) = HOST_LINE.captures(line) else {
            continue;
        };
        let address = caps[1].to_string();

        match field(line, "Status") {
            Some("Down") => return Err(Error::HostUnreachable(address)),
            Some("Timeout") => return Err(Error::HostTimeout(address)),
            _ => {}
        }

        let index = match results.iter().position(|r| r.host == address) {
            Some(index) => index,
            None => {
                results.push(ScanResult::new(address, Vec::new()));
                results.len() - 1
            }
        };

        let Some(ports) = field(line, "Ports") else {
            continue;
        };

        for entry in ports.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if let Some(observed) = parse_port_entry(entry)? {
                results[index].open_ports.push(observed);
            }
        }
    }

    Ok(results)
}

/// Value of a tab-separated `Name: value` field on a `Host:` line.
fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.split('\t').find_map(|part| {
        part.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim)
    })
}

/// Parse `22/open/tcp//ssh///`; returns `None` for ports that are not open.
fn parse_port_entry(entry: &str) -> Result<Option<ObservedPort>> {
    let caps = PORT_ENTRY
        .captures(entry)
        .ok_or_else(|| Error::ParseError(format!("Unrecognized port entry: {}", entry)))?;

    if &caps[2] != "open" {
        return Ok(None);
    }

    let port: u16 = caps[1]
        .parse()
        .map_err(|e| Error::ParseError(format!("Invalid port in `{}`: {}", entry, e)))?;

    match caps[3].parse::<Protocol>() {
        Ok(protocol) => Ok(Some(ObservedPort::new(port, protocol))),
        Err(_) => {
            tracing::debug!(entry, "ignoring port with unsupported protocol");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_OUTPUT: &str = "# Nmap 7.94 scan initiated Mon Jan  1 00:00:00 2024 as: nmap -Pn -n -sT -p 22,80,443 -oG - 127.0.0.1\n\
Host: 127.0.0.1 ()\tStatus: Up\n\
Host: 127.0.0.1 ()\tPorts: 22/open/tcp//ssh///, 80/open/tcp//http///, 443/closed/tcp//https///\n\
# Nmap done at Mon Jan  1 00:00:01 2024 -- 1 IP address (1 host up) scanned in 0.05 seconds\n";

    #[test]
    fn test_parse_open_tcp_ports() {
        let results = parse_grepable(TCP_OUTPUT).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].host, "127.0.0.1");
        assert_eq!(
            results[0].open_ports,
            vec![
                ObservedPort::new(22, Protocol::Tcp),
                ObservedPort::new(80, Protocol::Tcp)
            ]
        );
    }

    #[test]
    fn test_udp_open_filtered_is_not_open() {
        let output = "Host: 10.0.0.1 ()\tPorts: 53/open/udp//domain///, 123/open|filtered/udp//ntp///\n";
        let results = parse_grepable(output).unwrap();
        assert_eq!(results[0].open_ports, vec![ObservedPort::new(53, Protocol::Udp)]);
    }

    #[test]
    fn test_status_only_host_has_no_open_ports() {
        let output = "Host: 10.0.0.1 ()\tStatus: Up\nHost: 10.0.0.1 ()\tIgnored State: closed (30)\n";
        let results = parse_grepable(output).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].open_ports.is_empty());
    }

    #[test]
    fn test_timed_out_host_is_an_error() {
        let output = "Host: 10.0.0.1 ()\tStatus: Timeout\n";
        let err = parse_grepable(output).unwrap_err();
        assert!(matches!(err, Error::HostTimeout(ref host) if host == "10.0.0.1"));
    }

    #[test]
    fn test_down_host_is_unreachable() {
        let output = "Host: 10.0.0.2 ()\tStatus: Down\n";
        let err = parse_grepable(output).unwrap_err();
        assert!(matches!(err, Error::HostUnreachable(ref host) if host == "10.0.0.2"));
    }

    #[test]
    fn test_no_hosts() {
        let output = "# Nmap done at Mon Jan  1 00:00:01 2024 -- 0 IP addresses (0 hosts up) scanned in 0.01 seconds\n";
        assert!(parse_grepable(output).unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_protocol_is_skipped() {
        let output = "Host: 10.0.0.1 ()\tPorts: 80/open/sctp//http///, 81/open/tcp/////\n";
        let results = parse_grepable(output).unwrap();
        assert_eq!(results[0].open_ports, vec![ObservedPort::new(81, Protocol::Tcp)]);
    }

    #[test]
    fn test_garbage_port_entry_is_an_error() {
        let output = "Host: 10.0.0.1 ()\tPorts: nonsense\n";
        assert!(matches!(parse_grepable(output), Err(Error::ParseError(_))));
    }
}
