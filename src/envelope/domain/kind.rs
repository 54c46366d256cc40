//! Envelope kind discriminator.

use super::ParseEnvelopeKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of envelope carried on an agent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// A call expecting exactly one response or error.
    Request,
    /// A successful reply to a request.
    Response,
    /// A one-way message that never receives a reply.
    Notification,
    /// A failed reply to a request.
    Error,
}

impl EnvelopeKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Notification => "notification",
            Self::Error => "error",
        }
    }

    /// Returns whether the kind answers an earlier request.
    #[must_use]
    pub const fn is_reply(self) -> bool {
        matches!(self, Self::Response | Self::Error)
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EnvelopeKind {
    type Error = ParseEnvelopeKindError;

    fn try_from(value: &str) -> Result<Self, ParseEnvelopeKindError> {
        match value {
            "request" => Ok(Self::Request),
            "response" => Ok(Self::Response),
            "notification" => Ok(Self::Notification),
            "error" => Ok(Self::Error),
            _ => Err(ParseEnvelopeKindError(value.to_owned())),
        }
    }
}
