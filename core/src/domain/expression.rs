//! Port expression grammar.
//!
//! A port expression is a single inventory token of the form
//! `['-'] [protocol ':'] port`, for example `80`, `TCP:443` or `-UDP:53`.
//! A leading `-` means the port must be closed rather than open.
//!
//! The string helpers in this module work on raw tokens and never validate
//! them; [`PortExpression::parse`] is the validating entry point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker for "this port must be closed".
pub const NEGATION_OPERATOR: char = '-';

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol named by a port expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Recognized by the grammar but never scheduled for scanning.
    Icmp,
}

/// Protocol assumed for tokens that carry no explicit prefix.
pub const DEFAULT_PROTOCOL: Protocol = Protocol::Tcp;

impl Protocol {
    /// All recognized protocols.
    pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

    /// Upper-case tag used in expressions and titles (e.g. `TCP`).
    pub fn tag(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
        }
    }

    /// Expression prefix including the separator (e.g. `TCP:`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP:",
            Protocol::Udp => "UDP:",
            Protocol::Icmp => "ICMP:",
        }
    }

    /// Lower-case name, as reported by the scanner (e.g. `tcp`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
        }
    }

    /// Match an exact upper-case expression tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ExpressionError;

    /// Case-insensitive parse, used for scanner output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExpressionError::UnknownProtocol(s.to_string()))
    }
}

// ============================================================================
// PortState
// ============================================================================

/// Expected state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Token helpers
// ============================================================================

/// True iff the token starts with the negation operator.
pub fn is_negation(expr: &str) -> bool {
    expr.starts_with(NEGATION_OPERATOR)
}

/// Remove a single leading negation operator, leaving everything else intact.
pub fn replace_negation_operator(expr: &str) -> &str {
    expr.strip_prefix(NEGATION_OPERATOR).unwrap_or(expr)
}

/// Remove a recognized protocol prefix, keeping a leading negation operator.
///
/// `"-UDP:53"` becomes `"-53"`; tokens without a recognized prefix are
/// returned unchanged.
pub fn strip_protocol(expr: &str) -> String {
    let body = replace_negation_operator(expr);
    let stripped = Protocol::ALL
        .iter()
        .find_map(|p| body.strip_prefix(p.prefix()));

    match stripped {
        Some(port) if is_negation(expr) => format!("{NEGATION_OPERATOR}{port}"),
        Some(port) => port.to_string(),
        None => expr.to_string(),
    }
}

/// Whether the token belongs to the TCP bucket.
///
/// TCP is the fallback bucket: anything that is not explicitly `UDP:` or
/// `ICMP:` lands here, including tokens with no protocol at all.
pub fn tcp_only(expr: &str) -> bool {
    let body = replace_negation_operator(expr);
    if body.starts_with(Protocol::Tcp.prefix()) {
        return true;
    }
    !udp_only(expr) && !icmp_only(expr)
}

/// Whether the token belongs to the UDP bucket.
pub fn udp_only(expr: &str) -> bool {
    replace_negation_operator(expr).starts_with(Protocol::Udp.prefix())
}

/// Whether the token belongs to the ICMP bucket.
pub fn icmp_only(expr: &str) -> bool {
    replace_negation_operator(expr).starts_with(Protocol::Icmp.prefix())
}

/// Bucket a token is scheduled under. Unprefixed tokens get [`DEFAULT_PROTOCOL`].
pub fn bucket_of(expr: &str) -> Protocol {
    if udp_only(expr) {
        Protocol::Udp
    } else if icmp_only(expr) {
        Protocol::Icmp
    } else {
        debug_assert!(tcp_only(expr));
        DEFAULT_PROTOCOL
    }
}

// ============================================================================
// PortExpression
// ============================================================================

/// Errors produced when a token does not follow the expression grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("empty port expression")]
    Empty,

    #[error("unknown protocol `{0}`")]
    UnknownProtocol(String),

    #[error("invalid port `{0}`")]
    InvalidPort(String),

    #[error("port `{0}` is out of range (1-65535)")]
    PortOutOfRange(String),
}

/// A fully decomposed port expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortExpression {
    /// Leading negation operator present: the port must be closed.
    pub negated: bool,
    /// Explicit protocol prefix, `None` when the token had none.
    pub protocol: Option<Protocol>,
    pub port: u16,
}

impl PortExpression {
    /// Parse a token such as `-UDP:53`.
    pub fn parse(token: &str) -> Result<Self, ExpressionError> {
        if token.is_empty() {
            return Err(ExpressionError::Empty);
        }

        let negated = is_negation(token);
        let body = replace_negation_operator(token);

        let (protocol, port) = match body.split_once(':') {
            Some((tag, port)) => {
                let protocol = Protocol::from_tag(tag)
                    .ok_or_else(|| ExpressionError::UnknownProtocol(tag.to_string()))?;
                (Some(protocol), port)
            }
            None => (None, body),
        };

        Ok(Self {
            negated,
            protocol,
            port: parse_port(port)?,
        })
    }

    /// Protocol this expression is tested under.
    pub fn effective_protocol(&self) -> Protocol {
        self.protocol.unwrap_or(DEFAULT_PROTOCOL)
    }

    pub fn expected_state(&self) -> PortState {
        if self.negated {
            PortState::Closed
        } else {
            PortState::Open
        }
    }
}

impl fmt::Display for PortExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "{NEGATION_OPERATOR}")?;
        }
        if let Some(protocol) = self.protocol {
            f.write_str(protocol.prefix())?;
        }
        write!(f, "{}", self.port)
    }
}

impl FromStr for PortExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse the numeric part of an expression (`1*DIGIT`, 1-65535).
pub fn parse_port(digits: &str) -> Result<u16, ExpressionError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExpressionError::InvalidPort(digits.to_string()));
    }
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => Err(ExpressionError::PortOutOfRange(digits.to_string())),
        Ok(port) => Ok(port),
    }
}
