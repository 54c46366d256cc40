//! Identifier types for agents and correlated calls.

use super::EnvelopeDomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Maximum length for an agent identifier.
const MAX_AGENT_ID_LENGTH: usize = 128;

/// Prefix applied to correlation ids minted by the server.
const MINTED_PREFIX: &str = "agora-";

/// Validated identifier of a participating agent.
///
/// Agent identifiers are chosen by the agents themselves during the
/// handshake (e.g. `geo1`, `kg1`, `planner.eu-west`). Case is preserved.
///
/// # Examples
///
/// ```
/// use agora::envelope::domain::AgentId;
///
/// let id = AgentId::new(" geo1 ").expect("valid id");
/// assert_eq!(id.as_str(), "geo1");
/// assert!(AgentId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Creates a validated agent identifier.
    ///
    /// The input is trimmed. Only ASCII alphanumerics and `-`, `_`, `.`, `:`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeDomainError::EmptyAgentId`] when the value is empty
    /// after trimming, [`EnvelopeDomainError::AgentIdTooLong`] when it exceeds
    /// 128 characters, or [`EnvelopeDomainError::InvalidAgentId`] when it
    /// contains other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, EnvelopeDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(EnvelopeDomainError::EmptyAgentId);
        }

        if normalized.len() > MAX_AGENT_ID_LENGTH {
            return Err(EnvelopeDomainError::AgentIdTooLong(raw));
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));

        if !is_valid {
            return Err(EnvelopeDomainError::InvalidAgentId(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AgentId {
    type Error = EnvelopeDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier linking a request to its eventual response.
///
/// Mirrors the JSON-RPC `id` member: an integer or a string. `null` and
/// fractional numbers are not valid correlation ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    /// Integer identifier.
    Number(i64),
    /// String identifier.
    Text(String),
}

impl CorrelationId {
    /// Mints a fresh server-side correlation id.
    ///
    /// Minted ids are used when the router forwards a request so that ids
    /// chosen independently by different agents never collide.
    #[must_use]
    pub fn minted() -> Self {
        Self::Text(format!("{MINTED_PREFIX}{}", Uuid::new_v4()))
    }

    /// Interprets a JSON value as a correlation id.
    ///
    /// Returns `None` for `null`, fractional numbers, and non-scalar values.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    /// Returns the JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(number) => Value::from(*number),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl From<i64> for CorrelationId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
