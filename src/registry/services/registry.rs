//! Service layer for agent registration, discovery and liveness.
//!
//! Provides [`AgentRegistry`], a sharded concurrent table of connected agents
//! with a capability index and deregistration listeners.

use crate::envelope::domain::{AgentId, ErrorCode};
use crate::registry::{
    domain::{
        AgentHandle, AgentStatus, Capability, DeregistrationReason, LivenessReport,
        RegistryDomainError, RegistryStats,
    },
    ports::{AgentConnection, DeregistrationListener},
};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Service-level errors for registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An agent with the same identifier is already registered.
    #[error("agent already registered: {0}")]
    DuplicateAgent(AgentId),

    /// No agent with the identifier is registered.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),
}

impl RegistryError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateAgent(_) => ErrorCode::DuplicateAgent,
            Self::UnknownAgent(_) => ErrorCode::UnknownAgent,
            Self::Domain(_) => ErrorCode::InvalidParams,
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

struct AgentRecord {
    sequence: u64,
    capabilities: Arc<BTreeSet<Capability>>,
    status: AgentStatus,
    registered_at: DateTime<Utc>,
    last_heartbeat: DateTime<Utc>,
    connection: Arc<dyn AgentConnection>,
}

impl AgentRecord {
    fn snapshot(&self, id: &AgentId) -> AgentHandle {
        AgentHandle::new(
            id.clone(),
            Arc::clone(&self.capabilities),
            self.status,
            self.registered_at,
            self.last_heartbeat,
            Arc::clone(&self.connection),
        )
    }
}

/// Concurrent registry of connected agents.
///
/// The agent table and the capability index are separate sharded maps, so
/// operations on unrelated agents never contend on a single lock.
pub struct AgentRegistry<C>
where
    C: Clock + Send + Sync,
{
    agents: DashMap<AgentId, AgentRecord>,
    capability_index: DashMap<Capability, BTreeMap<u64, AgentId>>,
    listeners: RwLock<Vec<Arc<dyn DeregistrationListener>>>,
    next_sequence: AtomicU64,
    heartbeat_interval: TimeDelta,
    clock: Arc<C>,
}

impl<C> AgentRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry using the given liveness interval.
    #[must_use]
    pub fn new(clock: Arc<C>, heartbeat_interval: Duration) -> Self {
        Self {
            agents: DashMap::new(),
            capability_index: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
            heartbeat_interval: TimeDelta::from_std(heartbeat_interval).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Returns the configured heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> TimeDelta {
        self.heartbeat_interval
    }

    /// Adds an observer notified after every deregistration.
    pub fn add_listener(&self, listener: Arc<dyn DeregistrationListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Registers a new agent in `active` status.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateAgent`] when the identifier is
    /// already registered. The existing registration is left untouched.
    pub fn register(
        &self,
        id: AgentId,
        capabilities: impl IntoIterator<Item = Capability>,
        connection: Arc<dyn AgentConnection>,
    ) -> RegistryResult<AgentHandle> {
        let capability_set: BTreeSet<Capability> = capabilities.into_iter().collect();
        let now = self.clock.utc();

        let (handle, sequence) = match self.agents.entry(id.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateAgent(id)),
            Entry::Vacant(vacant) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                let record = AgentRecord {
                    sequence,
                    capabilities: Arc::new(capability_set),
                    status: AgentStatus::Active,
                    registered_at: now,
                    last_heartbeat: now,
                    connection,
                };
                let handle = record.snapshot(&id);
                vacant.insert(record);
                (handle, sequence)
            }
        };

        self.index(&id, sequence, handle.capabilities());
        tracing::info!(
            agent_id = %id,
            capabilities = handle.capabilities().len(),
            "agent registered"
        );
        Ok(handle)
    }

    /// Records a heartbeat, returning a `degraded` agent to `active`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAgent`] when the agent is not
    /// registered.
    pub fn heartbeat(&self, id: &AgentId) -> RegistryResult<AgentHandle> {
        let now = self.clock.utc();
        let mut record = self
            .agents
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
        record.last_heartbeat = now;
        if record.status == AgentStatus::Degraded {
            record.status = AgentStatus::Active;
            tracing::info!(agent_id = %id, "agent recovered");
        }
        Ok(record.snapshot(id))
    }

    /// Replaces an agent's capability set.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAgent`] when the agent is not
    /// registered.
    pub fn update_capabilities(
        &self,
        id: &AgentId,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> RegistryResult<AgentHandle> {
        let capability_set = Arc::new(capabilities.into_iter().collect::<BTreeSet<_>>());
        let handle = {
            let mut record = self
                .agents
                .get_mut(id)
                .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
            let previous = std::mem::replace(&mut record.capabilities, capability_set);
            // Reindex under the agent's entry lock so concurrent updates of
            // the same agent apply their index changes in order.
            self.unindex(record.sequence, &previous);
            self.index(id, record.sequence, &record.capabilities);
            record.snapshot(id)
        };

        tracing::debug!(
            agent_id = %id,
            capabilities = handle.capabilities().len(),
            "agent capabilities updated"
        );
        Ok(handle)
    }

    /// Removes an agent and notifies every listener.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAgent`] when the agent is not
    /// registered, including on a repeated call for the same agent.
    pub fn deregister(
        &self,
        id: &AgentId,
        reason: DeregistrationReason,
    ) -> RegistryResult<AgentHandle> {
        let (_, record) = self
            .agents
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
        Ok(self.release(id, record, reason))
    }

    /// Removes an agent only while it is still registered over `connection`.
    ///
    /// A session closing after its agent expired and re-registered on a new
    /// connection leaves the new registration untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAgent`] when the agent is not
    /// registered over `connection`.
    pub fn deregister_connection(
        &self,
        id: &AgentId,
        connection: &Arc<dyn AgentConnection>,
        reason: DeregistrationReason,
    ) -> RegistryResult<AgentHandle> {
        let (_, record) = self
            .agents
            .remove_if(id, |_, record| Arc::ptr_eq(&record.connection, connection))
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))?;
        Ok(self.release(id, record, reason))
    }

    /// Returns the holders of a capability in registration order.
    ///
    /// Active holders are preferred; degraded holders are returned only when
    /// no active holder exists.
    #[must_use]
    pub fn find(&self, capability: &Capability) -> Vec<AgentHandle> {
        prefer_active(self.holders(capability))
    }

    /// Like [`AgentRegistry::find`], but never returns `requester` itself.
    ///
    /// The active/degraded preference applies after the requester is
    /// removed, so a requester that is the only active holder still reaches
    /// a degraded peer.
    #[must_use]
    pub fn find_for(&self, capability: &Capability, requester: &AgentId) -> Vec<AgentHandle> {
        let mut holders = self.holders(capability);
        holders.retain(|handle| handle.id() != requester);
        prefer_active(holders)
    }

    /// Returns a snapshot of a registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAgent`] when the agent is not
    /// registered.
    pub fn lookup(&self, id: &AgentId) -> RegistryResult<AgentHandle> {
        self.agents
            .get(id)
            .map(|record| record.snapshot(id))
            .ok_or_else(|| RegistryError::UnknownAgent(id.clone()))
    }

    /// Lists agents in registration order, optionally filtered by capability.
    #[must_use]
    pub fn list(&self, capability: Option<&Capability>) -> Vec<AgentHandle> {
        match capability {
            Some(wanted) => self.holders(wanted),
            None => {
                let mut entries: Vec<(u64, AgentHandle)> = self
                    .agents
                    .iter()
                    .map(|entry| (entry.sequence, entry.snapshot(entry.key())))
                    .collect();
                entries.sort_by_key(|(sequence, _)| *sequence);
                entries.into_iter().map(|(_, handle)| handle).collect()
            }
        }
    }

    /// Applies the liveness policy at `now`.
    ///
    /// Agents silent for one interval move to `degraded`; agents silent for
    /// two intervals are reported as expired. Expired agents stay registered
    /// until the caller deregisters them.
    #[must_use]
    pub fn sweep_liveness(&self, now: DateTime<Utc>) -> LivenessReport {
        let expiry = self
            .heartbeat_interval
            .checked_add(&self.heartbeat_interval)
            .unwrap_or(TimeDelta::MAX);
        let mut report = LivenessReport::default();

        for mut entry in self.agents.iter_mut() {
            let silence = now.signed_duration_since(entry.last_heartbeat);
            if silence >= expiry {
                report.expired.push(entry.key().clone());
            } else if silence >= self.heartbeat_interval && entry.status == AgentStatus::Active {
                entry.status = AgentStatus::Degraded;
                report.degraded.push(entry.key().clone());
            }
        }

        for id in &report.degraded {
            tracing::warn!(agent_id = %id, "agent missed heartbeat");
        }
        report
    }

    /// Returns agent counts for the health surface.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.agents
            .iter()
            .fold(RegistryStats::default(), |mut stats, entry| {
                stats.agents += 1;
                match entry.status {
                    AgentStatus::Active => stats.active += 1,
                    AgentStatus::Degraded => stats.degraded += 1,
                    AgentStatus::Connecting | AgentStatus::Disconnected => {}
                }
                stats
            })
    }

    /// Returns the number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns whether no agent is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn release(
        &self,
        id: &AgentId,
        record: AgentRecord,
        reason: DeregistrationReason,
    ) -> AgentHandle {
        self.unindex(record.sequence, &record.capabilities);

        let handle = record.snapshot(id).with_status(AgentStatus::Disconnected);
        tracing::info!(agent_id = %id, reason = %reason, "agent deregistered");

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_deregistered(&handle, reason);
        }
        handle
    }

    fn holders(&self, capability: &Capability) -> Vec<AgentHandle> {
        let ids: Vec<AgentId> = self
            .capability_index
            .get(capability)
            .map(|holders| holders.values().cloned().collect())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.agents.get(id).map(|record| record.snapshot(id)))
            .collect()
    }

    fn index(&self, id: &AgentId, sequence: u64, capabilities: &BTreeSet<Capability>) {
        for capability in capabilities {
            self.capability_index
                .entry(capability.clone())
                .or_default()
                .insert(sequence, id.clone());
        }
    }

    fn unindex(&self, sequence: u64, capabilities: &BTreeSet<Capability>) {
        for capability in capabilities {
            if let Entry::Occupied(mut holders) = self.capability_index.entry(capability.clone()) {
                holders.get_mut().remove(&sequence);
                if holders.get().is_empty() {
                    holders.remove();
                }
            }
        }
    }
}

fn prefer_active(holders: Vec<AgentHandle>) -> Vec<AgentHandle> {
    let (active, degraded): (Vec<_>, Vec<_>) = holders
        .into_iter()
        .filter(|handle| handle.status().is_routable())
        .partition(|handle| handle.status() == AgentStatus::Active);
    if active.is_empty() { degraded } else { active }
}
