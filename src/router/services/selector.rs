//! Capability holder selection.

use crate::registry::domain::{AgentHandle, Capability};
use crate::router::domain::SelectionPolicy;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Picks one holder per request according to a [`SelectionPolicy`].
#[derive(Debug, Default)]
pub struct HolderSelector {
    policy: SelectionPolicy,
    cursors: DashMap<Capability, AtomicUsize>,
}

impl HolderSelector {
    /// Creates a selector for `policy`.
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            cursors: DashMap::new(),
        }
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Picks one of `holders`, which must be in registration order.
    ///
    /// An empty holder list drops the capability's cursor.
    #[must_use]
    pub fn select(&self, capability: &Capability, holders: Vec<AgentHandle>) -> Option<AgentHandle> {
        let count = holders.len();
        if count == 0 {
            self.forget(capability);
            return None;
        }
        let position = match self.policy {
            SelectionPolicy::FirstRegistered => 0,
            SelectionPolicy::RoundRobin => {
                let turn = self
                    .cursors
                    .entry(capability.clone())
                    .or_default()
                    .fetch_add(1, Ordering::Relaxed);
                turn.checked_rem(count)?
            }
        };
        holders.into_iter().nth(position)
    }

    /// Drops the round-robin cursor of a capability.
    pub fn forget(&self, capability: &Capability) {
        self.cursors.remove(capability);
    }

    /// Returns the number of capabilities with a round-robin cursor.
    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }
}
