//! Store reachability snapshots reported on the health surface.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Reachability {
    Healthy,
    Unhealthy,
}

/// Outcome of one store ping, as serialized under `graph_store` and
/// `spatial_store` in the health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    status: Reachability,
    checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl StoreHealth {
    /// The store answered its ping at `checked_at`.
    #[must_use]
    pub const fn healthy(checked_at: DateTime<Utc>) -> Self {
        Self {
            status: Reachability::Healthy,
            checked_at,
            message: None,
        }
    }

    /// The store failed its ping; `message` is server-authored detail.
    #[must_use]
    pub fn unhealthy(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            status: Reachability::Unhealthy,
            checked_at,
            message: Some(message.into()),
        }
    }

    /// Returns whether the store answered its last ping.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self.status, Reachability::Healthy)
    }

    /// Returns the failure detail, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
