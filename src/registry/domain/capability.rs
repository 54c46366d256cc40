//! Capability names declared by agents.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a capability name.
const MAX_CAPABILITY_LENGTH: usize = 128;

/// Method namespaces served by the server itself.
pub const RESERVED_NAMESPACES: [&str; 4] = ["graph.", "spatial.", "agent.", "rpc."];

/// A method name an agent declares it can serve.
///
/// # Examples
///
/// ```
/// use agora::registry::domain::Capability;
///
/// let capability = Capability::new("route.plan").expect("valid capability");
/// assert_eq!(capability.as_str(), "route.plan");
/// assert!(Capability::new("graph.upsertNode").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability(String);

impl Capability {
    /// Creates a validated capability name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when the name is empty, too long,
    /// contains whitespace or falls inside a server-owned namespace.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();

        if raw.is_empty() {
            return Err(RegistryDomainError::EmptyCapability);
        }

        if raw.len() > MAX_CAPABILITY_LENGTH {
            return Err(RegistryDomainError::CapabilityTooLong(raw));
        }

        if raw.chars().any(char::is_whitespace) {
            return Err(RegistryDomainError::CapabilityWhitespace(raw));
        }

        if RESERVED_NAMESPACES
            .iter()
            .any(|prefix| raw.starts_with(prefix))
        {
            return Err(RegistryDomainError::ReservedCapability(raw));
        }

        Ok(Self(raw))
    }

    /// Parses a list of capability names, rejecting the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the first invalid name.
    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>, RegistryDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Self::new).collect()
    }

    /// Returns the capability name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Capability {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.0
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
