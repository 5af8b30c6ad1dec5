//! File-backed inventory adapter.
//!
//! Inventories are YAML documents. JSON is valid YAML, so `.json`
//! inventories go through the same parser.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tokio::fs;

use crate::domain::{Group, Inventory, InventoryError, PortSpec, Section};
use crate::error::{Error, Result};
use crate::ports::InventorySource;

/// Inventory loaded from a file on disk.
#[derive(Debug, Clone)]
pub struct InventoryFile {
    path: PathBuf,
}

impl InventoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InventorySource for InventoryFile {
    async fn load(&self) -> Result<Inventory> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Config(format!(
                "Failed to read inventory {}: {}",
                self.path.display(),
                e
            ))
        })?;
        parse_inventory(&content)
    }
}

/// Parse inventory text, preserving document order throughout.
pub fn parse_inventory(content: &str) -> Result<Inventory> {
    let document: Value = serde_yaml::from_str(content)?;

    let sections = match document {
        Value::Null => Vec::new(),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, value)| parse_section(key, value))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        other => {
            return Err(malformed(format!(
                "top level must be a mapping, found {}",
                kind(&other)
            )))
        }
    };

    Ok(Inventory::new(sections))
}

fn parse_section(key: &Value, value: &Value) -> std::result::Result<Section, InventoryError> {
    let test_type = key_string(key)?;
    let groups = match value {
        Value::Null => Vec::new(),
        Value::Mapping(map) => map
            .iter()
            .map(|(name, hosts)| parse_group(name, hosts))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        other => {
            return Err(InventoryError::Malformed(format!(
                "section `{}` must be a mapping, found {}",
                test_type,
                kind(other)
            )))
        }
    };
    Ok(Section { test_type, groups })
}

fn parse_group(key: &Value, value: &Value) -> std::result::Result<Group, InventoryError> {
    let name = key_string(key)?;
    let hosts = match value {
        Value::Null => Vec::new(),
        Value::Mapping(map) => map
            .iter()
            .map(|(host, spec)| Ok((key_string(host)?, parse_port_spec(spec)?)))
            .collect::<std::result::Result<Vec<_>, InventoryError>>()?,
        other => {
            return Err(InventoryError::Malformed(format!(
                "group `{}` must map hosts to ports, found {}",
                name,
                kind(other)
            )))
        }
    };
    Ok(Group { name, hosts })
}

fn parse_port_spec(value: &Value) -> std::result::Result<PortSpec, InventoryError> {
    match value {
        Value::Null => Ok(PortSpec::empty()),
        Value::String(s) => Ok(PortSpec::Tokens(s.clone())),
        Value::Number(n) => Ok(PortSpec::Tokens(n.to_string())),
        Value::Sequence(items) => items
            .iter()
            .map(parse_port_spec)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(PortSpec::List),
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| Ok((key_string(k)?, parse_port_spec(v)?)))
            .collect::<std::result::Result<Vec<_>, InventoryError>>()
            .map(PortSpec::Nested),
        Value::Tagged(tagged) => parse_port_spec(&tagged.value),
        other => Err(InventoryError::Malformed(format!(
            "port list must be a string, number, list or mapping, found {}",
            kind(other)
        ))),
    }
}

fn key_string(key: &Value) -> std::result::Result<String, InventoryError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(InventoryError::Malformed(format!(
            "keys must be strings, found {}",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn malformed(message: String) -> Error {
    Error::Inventory(InventoryError::Malformed(message))
}
