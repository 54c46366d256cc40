//! Holder selection when several agents serve one capability.

use super::ParseSelectionPolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a request picks among several holders of its capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Rotate through holders with a per-capability cursor.
    #[default]
    RoundRobin,
    /// Always pick the earliest registered holder.
    FirstRegistered,
}

impl SelectionPolicy {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::FirstRegistered => "first_registered",
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SelectionPolicy {
    type Error = ParseSelectionPolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "round_robin" => Ok(Self::RoundRobin),
            "first_registered" => Ok(Self::FirstRegistered),
            _ => Err(ParseSelectionPolicyError(value.to_owned())),
        }
    }
}
