//! Shared supervisor: session factory, liveness sweep and shutdown.

use super::Session;
use crate::envelope::codec::EnvelopeCodec;
use crate::registry::{
    domain::DeregistrationReason, ports::AgentConnection, services::AgentRegistry,
};
use crate::router::services::Router;
use crate::session::ports::CredentialVerifier;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Session timing taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long a new connection may take to register.
    pub handshake_timeout: Duration,
    /// Period of the shared liveness and deadline sweep.
    pub sweep_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Agents that just missed a heartbeat.
    pub degraded: usize,
    /// Agents deregistered after two silent intervals.
    pub expired: usize,
    /// Pending calls answered with `Timeout`.
    pub timed_out: usize,
}

impl SweepReport {
    /// Returns whether the sweep changed nothing.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.degraded == 0 && self.expired == 0 && self.timed_out == 0
    }
}

/// Creates sessions and enforces liveness across all of them.
pub struct Supervisor<C>
where
    C: Clock + Send + Sync + 'static,
{
    router: Arc<Router<C>>,
    verifier: Arc<dyn CredentialVerifier>,
    codec: EnvelopeCodec,
    settings: SessionSettings,
    clock: Arc<C>,
}

impl<C> Supervisor<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a supervisor.
    #[must_use]
    pub fn new(
        router: Arc<Router<C>>,
        verifier: Arc<dyn CredentialVerifier>,
        codec: EnvelopeCodec,
        settings: SessionSettings,
        clock: Arc<C>,
    ) -> Self {
        Self {
            router,
            verifier,
            codec,
            settings,
            clock,
        }
    }

    /// Returns the router sessions dispatch to.
    #[must_use]
    pub const fn router(&self) -> &Arc<Router<C>> {
        &self.router
    }

    /// Returns the agent registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AgentRegistry<C>> {
        self.router.registry()
    }

    /// Returns the credential verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    /// Returns the wire codec.
    #[must_use]
    pub const fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Returns the session timing.
    #[must_use]
    pub const fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Opens a session in `connecting` state for a new connection.
    #[must_use]
    pub fn open(self: &Arc<Self>, connection: Arc<dyn AgentConnection>) -> Session<C> {
        Session::new(Arc::clone(self), connection)
    }

    /// Runs the heartbeat sweep and the deadline sweep at `now`.
    ///
    /// Expired agents are deregistered and their connections closed.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let liveness = self.registry().sweep_liveness(now);
        let mut expired = 0_usize;
        for id in &liveness.expired {
            if let Ok(handle) = self
                .registry()
                .deregister(id, DeregistrationReason::HeartbeatExpired)
            {
                handle.close(DeregistrationReason::HeartbeatExpired.as_str());
                expired += 1;
            }
        }
        SweepReport {
            degraded: liveness.degraded.len(),
            expired,
            timed_out: self.router.sweep_expired(now),
        }
    }

    /// Starts the shared background sweeper.
    ///
    /// The task stops when `shutdown` flips to `true` or its sender drops.
    pub fn spawn_sweeper(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(supervisor.settings.sweep_interval.max(MIN_SWEEP_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = supervisor.sweep(supervisor.clock.utc());
                        if !report.is_quiet() {
                            tracing::debug!(
                                degraded = report.degraded,
                                expired = report.expired,
                                timed_out = report.timed_out,
                                "sweep completed"
                            );
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("sweeper stopped");
        })
    }

    /// Deregisters every agent and closes its connection.
    ///
    /// Returns the number of agents removed.
    pub fn shutdown(&self) -> usize {
        let mut closed = 0_usize;
        for handle in self.registry().list(None) {
            if self
                .registry()
                .deregister(handle.id(), DeregistrationReason::Shutdown)
                .is_ok()
            {
                handle.close(DeregistrationReason::Shutdown.as_str());
                closed += 1;
            }
        }
        closed
    }
}
