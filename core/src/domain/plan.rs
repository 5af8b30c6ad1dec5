//! Test planning: turning inventory entries into schedulable test units.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::expression::{
    bucket_of, is_negation, replace_negation_operator, strip_protocol, PortExpression,
};
use super::inventory::{is_valid_group_name, Inventory, InventoryError, PortSpec, TestType};
use super::{PortState, Protocol};

/// How tokens are grouped into test units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitGranularity {
    /// One unit per (host, protocol bucket).
    #[default]
    Bucket,
    /// One unit per token.
    Port,
}

/// Flatten a host's port declaration into one ordered token list.
///
/// Order and duplicates are preserved.
pub fn find_local_ports_to_test(spec: &PortSpec) -> Vec<String> {
    let mut tokens = Vec::new();
    collect_tokens(spec, &mut tokens);
    tokens
}

fn collect_tokens(spec: &PortSpec, tokens: &mut Vec<String>) {
    match spec {
        PortSpec::Tokens(text) => tokens.extend(text.split_whitespace().map(str::to_string)),
        PortSpec::List(items) => items.iter().for_each(|item| collect_tokens(item, tokens)),
        PortSpec::Nested(entries) => entries
            .iter()
            .for_each(|(_, item)| collect_tokens(item, tokens)),
    }
}

/// Tokens of one host split by protocol bucket, each in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub tcp: Vec<String>,
    pub udp: Vec<String>,
    pub icmp: Vec<String>,
}

impl Buckets {
    pub fn get(&self, protocol: Protocol) -> &[String] {
        match protocol {
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
            Protocol::Icmp => &self.icmp,
        }
    }
}

/// Partition tokens into protocol buckets.
pub fn partition(tokens: &[String]) -> Buckets {
    let mut buckets = Buckets::default();
    for token in tokens {
        match bucket_of(token) {
            Protocol::Tcp => buckets.tcp.push(token.clone()),
            Protocol::Udp => buckets.udp.push(token.clone()),
            Protocol::Icmp => buckets.icmp.push(token.clone()),
        }
    }
    buckets
}

/// `"80 open"` / `"443 closed"` for one token.
pub fn token_label(token: &str) -> String {
    let state = if is_negation(token) {
        PortState::Closed
    } else {
        PortState::Open
    };
    let port = strip_protocol(replace_negation_operator(token));
    format!("{port} {state}")
}

/// `"TCP:80 open,443 closed"` for a bucket.
pub fn bucket_title(tokens: &[String], protocol: Protocol) -> String {
    let labels: Vec<String> = tokens.iter().map(|t| token_label(t)).collect();
    format!("{}:{}", protocol.tag(), labels.join(","))
}

/// One independently schedulable unit: a host, its tokens for one protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUnitSpec {
    pub group: String,
    /// Host identifier; may hold several space-separated hosts.
    pub host: String,
    pub protocol: Protocol,
    pub tokens: Vec<String>,
}

impl TestUnitSpec {
    pub fn new(
        group: impl Into<String>,
        host: impl Into<String>,
        protocol: Protocol,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            group: group.into(),
            host: host.into(),
            protocol,
            tokens,
        }
    }

    pub fn hosts(&self) -> Vec<String> {
        self.host.split_whitespace().map(str::to_string).collect()
    }

    /// Assertions this unit declares up front: hosts x tokens.
    pub fn plan(&self) -> usize {
        if self.tokens.is_empty() {
            return 0;
        }
        self.hosts().len() * self.tokens.len()
    }

    /// `"<group> <host> <PROTOCOL>:<port> <state>,..."`.
    pub fn title(&self) -> String {
        format!(
            "{} {} {}",
            self.group,
            self.host,
            bucket_title(&self.tokens, self.protocol)
        )
        .trim()
        .to_string()
    }
}

/// Builds test units from an inventory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilder {
    granularity: UnitGranularity,
}

impl PlanBuilder {
    pub fn new(granularity: UnitGranularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> UnitGranularity {
        self.granularity
    }

    /// Validate the inventory and produce units in document order.
    ///
    /// Every structural problem or malformed token is an error; nothing is
    /// scheduled for an invalid inventory.
    pub fn build(&self, inventory: &Inventory) -> Result<Vec<TestUnitSpec>, InventoryError> {
        let mut units = Vec::new();

        for section in &inventory.sections {
            match TestType::from_key(&section.test_type)? {
                TestType::Kubernetes => {
                    warn!(test_type = %section.test_type, "kubernetes tests are not implemented, skipping");
                    continue;
                }
                TestType::Host => {}
            }

            for group in &section.groups {
                if !is_valid_group_name(&group.name) {
                    return Err(InventoryError::UnknownGroup {
                        test_type: section.test_type.clone(),
                        group: group.name.clone(),
                    });
                }

                for (host, spec) in &group.hosts {
                    let tokens = find_local_ports_to_test(spec);
                    validate_tokens(host, &tokens)?;
                    debug!(group = %group.name, %host, ports = %tokens.join(","), "ports to test");
                    units.extend(self.units_for_host(&group.name, host, &tokens));
                }
            }
        }

        Ok(units)
    }

    /// Units for one host's flattened tokens.
    pub fn units_for_host(&self, group: &str, host: &str, tokens: &[String]) -> Vec<TestUnitSpec> {
        let buckets = partition(tokens);

        if !buckets.icmp.is_empty() {
            warn!(%host, ports = %buckets.icmp.join(","), "ICMP expressions are not supported, skipping");
        }

        let hosts: Vec<&str> = host.split_whitespace().collect();
        if hosts.len() > 1 && (!buckets.tcp.is_empty() || !buckets.udp.is_empty()) {
            warn!(
                %host,
                scanned = hosts[0],
                skipped = %hosts[1..].join(" "),
                "multiple hosts in one entry: only the first host is scanned, the plan will not be met"
            );
        }

        let mut units = Vec::new();
        for protocol in [Protocol::Tcp, Protocol::Udp] {
            let bucket = buckets.get(protocol);
            if bucket.is_empty() {
                continue;
            }
            match self.granularity {
                UnitGranularity::Bucket => {
                    units.push(TestUnitSpec::new(group, host, protocol, bucket.to_vec()));
                }
                UnitGranularity::Port => units.extend(
                    bucket
                        .iter()
                        .map(|t| TestUnitSpec::new(group, host, protocol, vec![t.clone()])),
                ),
            }
        }
        units
    }
}

fn validate_tokens(host: &str, tokens: &[String]) -> Result<(), InventoryError> {
    for token in tokens {
        PortExpression::parse(token).map_err(|source| InventoryError::InvalidExpression {
            host: host.to_string(),
            token: token.clone(),
            source,
        })?;
    }
    Ok(())
}
