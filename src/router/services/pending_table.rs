//! Sharded table of pending calls.

use crate::envelope::domain::{AgentId, CorrelationId};
use crate::router::domain::{CallTarget, PendingCall};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

/// Why a pending call could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInsertError {
    /// The originator already has a pending call under the same id.
    OriginalIdInUse,
    /// The forwarded id is already tracked.
    ForwardedIdInUse,
}

/// Pending calls keyed by forwarded id with an index by originator id.
#[derive(Debug, Default)]
pub struct PendingTable {
    calls: DashMap<CorrelationId, PendingCall>,
    by_origin: DashMap<(AgentId, CorrelationId), CorrelationId>,
}

impl PendingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a call without overwriting an existing one.
    pub fn insert(&self, call: PendingCall) -> Result<(), PendingInsertError> {
        let origin_key = (call.originator().clone(), call.original_id().clone());
        match self.by_origin.entry(origin_key) {
            Entry::Occupied(_) => Err(PendingInsertError::OriginalIdInUse),
            Entry::Vacant(origin_slot) => match self.calls.entry(call.forwarded_id().clone()) {
                Entry::Occupied(_) => Err(PendingInsertError::ForwardedIdInUse),
                Entry::Vacant(call_slot) => {
                    origin_slot.insert(call.forwarded_id().clone());
                    call_slot.insert(call);
                    Ok(())
                }
            },
        }
    }

    /// Removes the call if `responder` is the party it waits for.
    pub fn take(&self, forwarded_id: &CorrelationId, responder: &CallTarget) -> Option<PendingCall> {
        let (_, call) = self
            .calls
            .remove_if(forwarded_id, |_, call| call.target() == responder)?;
        self.unindex(&call);
        Some(call)
    }

    /// Removes and returns every call whose deadline elapsed at `now`.
    pub fn drain_expired(&self, now: DateTime<Utc>) -> Vec<PendingCall> {
        self.drain_where(|call| call.is_expired(now))
    }

    /// Removes every call originated by or targeting `agent`.
    ///
    /// Returns `(originated, targeted)`.
    pub fn drain_agent(&self, agent: &AgentId) -> (Vec<PendingCall>, Vec<PendingCall>) {
        let target = CallTarget::Agent(agent.clone());
        self.drain_where(|call| call.originator() == agent || call.target() == &target)
            .into_iter()
            .partition(|call| call.originator() == agent)
    }

    /// Returns whether a call is tracked under `forwarded_id`.
    #[must_use]
    pub fn contains(&self, forwarded_id: &CorrelationId) -> bool {
        self.calls.contains_key(forwarded_id)
    }

    /// Returns the number of pending calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns whether no call is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn drain_where(&self, predicate: impl Fn(&PendingCall) -> bool) -> Vec<PendingCall> {
        let candidates: Vec<CorrelationId> = self
            .calls
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();
        let drained: Vec<PendingCall> = candidates
            .iter()
            .filter_map(|id| self.calls.remove_if(id, |_, call| predicate(call)))
            .map(|(_, call)| call)
            .collect();
        for call in &drained {
            self.unindex(call);
        }
        drained
    }

    fn unindex(&self, call: &PendingCall) {
        self.by_origin
            .remove_if(&(call.originator().clone(), call.original_id().clone()), |_, forwarded| {
                forwarded == call.forwarded_id()
            });
    }
}
