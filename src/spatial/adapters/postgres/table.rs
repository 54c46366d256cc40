//! Validated table identifier interpolated into spatial SQL.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Error returned for table names that are not plain SQL identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid table name '{0}': expected [schema.]identifier of letters, digits and underscores")]
pub struct InvalidTableName(pub String);

/// A plain, optionally schema-qualified, SQL table identifier.
///
/// Identifiers cannot be bound as query parameters, so only names that are
/// safe to splice into SQL text are accepted.
///
/// # Examples
///
/// ```
/// use agora::spatial::adapters::TableName;
///
/// assert!(TableName::new("public.puzzle_pieces").is_ok());
/// assert!(TableName::new("pieces; DROP TABLE x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Validates a table identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTableName`] when any dotted part is empty, too long,
    /// starts with a digit or contains anything but ASCII letters, digits
    /// and underscores.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidTableName> {
        let raw = value.into();
        let mut parts = raw.split('.');
        let valid = parts.clone().count() <= 2 && parts.all(is_identifier);
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidTableName(raw))
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self("puzzle_pieces".to_owned())
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    part.len() <= MAX_IDENTIFIER_LENGTH
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

impl TryFrom<String> for TableName {
    type Error = InvalidTableName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
