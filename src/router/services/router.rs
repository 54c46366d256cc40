//! Request routing, reply correlation and deadline enforcement.

use super::{HolderSelector, PendingInsertError, PendingTable};
use crate::envelope::domain::{
    AgentId, CorrelationId, Envelope, EnvelopeKind, ErrorCode, RpcError,
};
use crate::graph::{
    domain::GraphOperation,
    ports::GraphStore,
    services::{GraphGateway, GraphGatewayError},
};
use crate::registry::{
    domain::{AgentHandle, Capability},
    services::AgentRegistry,
};
use crate::router::domain::{CallTarget, PendingCall, Route, SelectionPolicy};
use crate::spatial::{
    domain::SpatialOperation,
    ports::SpatialStore,
    services::{SpatialGateway, SpatialGatewayError},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const GRAPH_PREFIX: &str = "graph.";
const SPATIAL_PREFIX: &str = "spatial.";

/// Errors answered to the sender of a request the router could not place.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// The envelope has no sender.
    #[error("envelope has no sender")]
    MissingSender,

    /// The envelope lacks a member its kind requires.
    #[error("envelope is missing its {0}")]
    Incomplete(&'static str),

    /// The explicit target is not registered.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// No agent serves the method.
    #[error("no agent serves method '{0}'")]
    MethodNotFound(String),

    /// The originator reused one of its own pending correlation ids.
    #[error("correlation id {0} is already pending")]
    DuplicateCorrelationId(CorrelationId),

    /// The target's connection is gone.
    #[error("agent {0} is unavailable")]
    PeerUnavailable(AgentId),

    /// The graph operation could not be parsed.
    #[error(transparent)]
    Graph(#[from] GraphGatewayError),

    /// The spatial operation could not be parsed.
    #[error(transparent)]
    Spatial(#[from] SpatialGatewayError),

    /// A minted correlation id collided.
    #[error("internal routing failure")]
    Internal,
}

impl RouterError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::MissingSender | Self::Internal => ErrorCode::Internal,
            Self::Incomplete(_) | Self::DuplicateCorrelationId(_) => ErrorCode::MalformedMessage,
            Self::UnknownAgent(_) => ErrorCode::UnknownAgent,
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::PeerUnavailable(_) => ErrorCode::PeerUnavailable,
            Self::Graph(err) => err.to_error_code(),
            Self::Spatial(err) => err.to_error_code(),
        }
    }

    /// Builds the wire error object.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Graph(err) => err.to_rpc_error(),
            Self::Spatial(err) => err.to_rpc_error(),
            Self::MissingSender | Self::Internal => RpcError::from_code(self.to_error_code()),
            other => RpcError::from_code(other.to_error_code()).with_detail(other.to_string()),
        }
    }
}

/// Result of dispatching one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A request was forwarded and is now pending under the minted id.
    Forwarded(CorrelationId),
    /// A notification or reply was handed to one agent.
    Delivered(AgentId),
    /// A notification was handed to this many agents.
    Broadcast(usize),
    /// A gateway notification was started without tracking.
    FireAndForget,
    /// The envelope was discarded.
    Dropped,
}

/// Router settings taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterSettings {
    /// Deadline applied to every forwarded request.
    pub call_timeout: Duration,
    /// How requests choose among capability holders.
    pub selection_policy: SelectionPolicy,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            selection_policy: SelectionPolicy::RoundRobin,
        }
    }
}

/// Shared graph gateway over any store implementation.
pub type SharedGraphGateway = Arc<GraphGateway<dyn GraphStore>>;

/// Shared spatial gateway over any store implementation.
pub type SharedSpatialGateway = Arc<SpatialGateway<dyn SpatialStore>>;

/// Dispatch router.
///
/// Methods taking `self: &Arc<Self>` may spawn gateway tasks and must run
/// inside a Tokio runtime.
pub struct Router<C>
where
    C: Clock + Send + Sync,
{
    registry: Arc<AgentRegistry<C>>,
    graph: SharedGraphGateway,
    spatial: SharedSpatialGateway,
    pending: PendingTable,
    selector: HolderSelector,
    call_timeout: TimeDelta,
    clock: Arc<C>,
}

impl<C> Router<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a router over the given registry and gateways.
    #[must_use]
    pub fn new(
        registry: Arc<AgentRegistry<C>>,
        graph: SharedGraphGateway,
        spatial: SharedSpatialGateway,
        clock: Arc<C>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            registry,
            graph,
            spatial,
            pending: PendingTable::new(),
            selector: HolderSelector::new(settings.selection_policy),
            call_timeout: TimeDelta::from_std(settings.call_timeout).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Returns the registry the router resolves agents in.
    #[must_use]
    pub const fn registry(&self) -> &Arc<AgentRegistry<C>> {
        &self.registry
    }

    /// Returns the graph gateway.
    #[must_use]
    pub const fn graph(&self) -> &SharedGraphGateway {
        &self.graph
    }

    /// Returns the spatial gateway.
    #[must_use]
    pub const fn spatial(&self) -> &SharedSpatialGateway {
        &self.spatial
    }

    /// Returns the number of pending calls.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether a call is pending under a forwarded id.
    #[must_use]
    pub fn is_pending(&self, forwarded_id: &CorrelationId) -> bool {
        self.pending.contains(forwarded_id)
    }

    /// Dispatches an ingress envelope whose `from` is already trusted.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError`] when a request cannot be placed. The caller
    /// answers the sender with [`RouterError::to_rpc_error`].
    pub fn dispatch(self: &Arc<Self>, envelope: Envelope) -> Result<Dispatch, RouterError> {
        let sender = envelope.sender().cloned().ok_or(RouterError::MissingSender)?;
        match envelope.kind() {
            EnvelopeKind::Request => self.dispatch_request(sender, envelope),
            EnvelopeKind::Notification => Ok(self.dispatch_notification(&sender, envelope)),
            EnvelopeKind::Response | EnvelopeKind::Error => Ok(self.dispatch_reply(sender, envelope)),
        }
    }

    /// Resolves the route of a request or notification from `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownAgent`] for an unregistered explicit
    /// target, [`RouterError::MethodNotFound`] when nothing serves the
    /// method, and a gateway error for malformed `graph.*`/`spatial.*`
    /// parameters.
    pub fn resolve(&self, sender: &AgentId, envelope: &Envelope) -> Result<Route, RouterError> {
        if let Some(target) = envelope.target() {
            self.registry
                .lookup(target)
                .map_err(|_| RouterError::UnknownAgent(target.clone()))?;
            return Ok(Route::Agent(target.clone()));
        }

        let method = envelope.method().ok_or(RouterError::Incomplete("method"))?;
        if method.starts_with(GRAPH_PREFIX) {
            let operation = GraphOperation::parse(method, envelope.params())
                .map_err(GraphGatewayError::from)?;
            return Ok(Route::Graph(operation));
        }
        if method.starts_with(SPATIAL_PREFIX) {
            let operation = SpatialOperation::parse(method, envelope.params())
                .map_err(SpatialGatewayError::from)?;
            return Ok(Route::Spatial(operation));
        }

        let capability =
            Capability::new(method).map_err(|_| RouterError::MethodNotFound(method.to_owned()))?;
        if envelope.kind() == EnvelopeKind::Notification {
            let holders = self.holders_except(&capability, sender);
            if holders.is_empty() {
                return Err(RouterError::MethodNotFound(method.to_owned()));
            }
            return Ok(Route::Broadcast(
                holders.into_iter().map(|handle| handle.id().clone()).collect(),
            ));
        }

        let preferred = self.registry.find_for(&capability, sender);
        self.selector
            .select(&capability, preferred)
            .map(|handle| Route::Agent(handle.id().clone()))
            .ok_or_else(|| RouterError::MethodNotFound(method.to_owned()))
    }

    /// Settles every call whose deadline elapsed at `now` with `Timeout`.
    ///
    /// Returns the number of timed-out calls.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = self.pending.drain_expired(now);
        for call in &expired {
            tracing::info!(
                correlation_id = %call.original_id(),
                originator = %call.originator(),
                route = %call.target(),
                method = call.method(),
                "pending call timed out"
            );
            let detail = format!("no reply from {} for '{}'", call.target(), call.method());
            let envelope =
                Envelope::error_code(call.original_id().clone(), ErrorCode::Timeout, Some(detail));
            self.deliver_to(call.originator(), envelope);
        }
        expired.len()
    }

    /// Drops round-robin state for capabilities that have no holder left.
    pub fn prune_capabilities<'a>(&self, capabilities: impl IntoIterator<Item = &'a Capability>) {
        for capability in capabilities {
            if self.registry.list(Some(capability)).is_empty() {
                self.selector.forget(capability);
            }
        }
    }

    /// Returns the number of capabilities with round-robin state.
    #[must_use]
    pub fn tracked_capabilities(&self) -> usize {
        self.selector.cursor_count()
    }

    /// Settles the calls of a departed agent.
    ///
    /// Every call it took part in is answered with `PeerUnavailable` to the
    /// remaining party. An originator gets its own id back; an agent still
    /// serving a call from the departed agent gets the forwarded id. Gateway
    /// calls from the departed agent are simply forgotten.
    pub fn release_agent(&self, agent: &AgentId) {
        let (originated, targeted) = self.pending.drain_agent(agent);
        if !originated.is_empty() {
            tracing::debug!(
                agent_id = %agent,
                calls = originated.len(),
                "cancelled calls from departed agent"
            );
        }
        for call in originated {
            if let Some(target) = call.target().agent() {
                let envelope = Envelope::error_code(
                    call.forwarded_id().clone(),
                    ErrorCode::PeerUnavailable,
                    Some(format!("caller {agent} disconnected")),
                );
                self.deliver_to(target, envelope);
            }
        }
        for call in targeted {
            let envelope = Envelope::error_code(
                call.original_id().clone(),
                ErrorCode::PeerUnavailable,
                Some(format!("agent {agent} disconnected")),
            );
            self.deliver_to(call.originator(), envelope);
        }
    }

    fn dispatch_request(
        self: &Arc<Self>,
        sender: AgentId,
        envelope: Envelope,
    ) -> Result<Dispatch, RouterError> {
        let original_id = envelope.id().cloned().ok_or(RouterError::Incomplete("id"))?;
        let route = self.resolve(&sender, &envelope)?;
        let method = envelope.method().unwrap_or_default().to_owned();
        tracing::debug!(
            agent_id = %sender,
            method = %method,
            correlation_id = %original_id,
            route = route.label(),
            "routing request"
        );

        match route {
            Route::Agent(target) => {
                let handle = self
                    .registry
                    .lookup(&target)
                    .map_err(|_| RouterError::UnknownAgent(target.clone()))?;
                let call = self.track(sender.clone(), original_id, CallTarget::Agent(target), method)?;
                let forwarded_id = call.forwarded_id().clone();
                let forwarded = envelope.with_id(forwarded_id.clone()).with_sender(sender);
                if handle.deliver(forwarded).is_err() {
                    let _released = self.pending.take(&forwarded_id, call.target());
                    return Err(RouterError::PeerUnavailable(handle.id().clone()));
                }
                Ok(Dispatch::Forwarded(forwarded_id))
            }
            Route::Graph(operation) => {
                let call = self.track(sender, original_id, CallTarget::Graph, method)?;
                let forwarded_id = call.forwarded_id().clone();
                let router = Arc::clone(self);
                tokio::spawn(async move {
                    let outcome = router
                        .graph
                        .execute(operation)
                        .await
                        .map(|result| result.to_json())
                        .map_err(|err| err.to_rpc_error());
                    router.complete(call.forwarded_id(), &CallTarget::Graph, outcome);
                });
                Ok(Dispatch::Forwarded(forwarded_id))
            }
            Route::Spatial(operation) => {
                let call = self.track(sender, original_id, CallTarget::Spatial, method)?;
                let forwarded_id = call.forwarded_id().clone();
                let router = Arc::clone(self);
                tokio::spawn(async move {
                    let outcome = router
                        .spatial
                        .execute(operation)
                        .await
                        .map(|result| result.to_json())
                        .map_err(|err| err.to_rpc_error());
                    router.complete(call.forwarded_id(), &CallTarget::Spatial, outcome);
                });
                Ok(Dispatch::Forwarded(forwarded_id))
            }
            Route::Broadcast(_) => Err(RouterError::MethodNotFound(method)),
        }
    }

    fn dispatch_notification(self: &Arc<Self>, sender: &AgentId, envelope: Envelope) -> Dispatch {
        let route = match self.resolve(sender, &envelope) {
            Ok(route) => route,
            Err(err) => {
                tracing::debug!(
                    agent_id = %sender,
                    method = envelope.method().unwrap_or_default(),
                    error = %err,
                    "notification dropped"
                );
                return Dispatch::Dropped;
            }
        };

        match route {
            Route::Agent(target) => {
                if self.deliver_to(&target, envelope) {
                    Dispatch::Delivered(target)
                } else {
                    Dispatch::Dropped
                }
            }
            Route::Broadcast(targets) => {
                let delivered = targets
                    .iter()
                    .filter(|target| self.deliver_to(target, envelope.clone()))
                    .count();
                Dispatch::Broadcast(delivered)
            }
            Route::Graph(operation) => {
                let router = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = router.graph.execute(operation).await {
                        tracing::debug!(error = %err, "graph notification failed");
                    }
                });
                Dispatch::FireAndForget
            }
            Route::Spatial(operation) => {
                let router = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = router.spatial.execute(operation).await {
                        tracing::debug!(error = %err, "spatial notification failed");
                    }
                });
                Dispatch::FireAndForget
            }
        }
    }

    fn dispatch_reply(&self, responder: AgentId, envelope: Envelope) -> Dispatch {
        let Some(forwarded_id) = envelope.id().cloned() else {
            return Dispatch::Dropped;
        };
        let Some(call) = self
            .pending
            .take(&forwarded_id, &CallTarget::Agent(responder.clone()))
        else {
            tracing::debug!(
                agent_id = %responder,
                correlation_id = %forwarded_id,
                "dropped reply without a matching pending call"
            );
            return Dispatch::Dropped;
        };

        let reply = envelope
            .with_id(call.original_id().clone())
            .with_sender(responder);
        if self.deliver_to(call.originator(), reply) {
            Dispatch::Delivered(call.originator().clone())
        } else {
            Dispatch::Dropped
        }
    }

    fn track(
        &self,
        originator: AgentId,
        original_id: CorrelationId,
        target: CallTarget,
        method: String,
    ) -> Result<PendingCall, RouterError> {
        let issued_at = self.clock.utc();
        let deadline = issued_at
            .checked_add_signed(self.call_timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let call = PendingCall::new(
            CorrelationId::minted(),
            originator,
            original_id.clone(),
            target,
            method,
            issued_at,
            deadline,
        );
        self.pending.insert(call.clone()).map_err(|err| match err {
            PendingInsertError::OriginalIdInUse => RouterError::DuplicateCorrelationId(original_id),
            PendingInsertError::ForwardedIdInUse => RouterError::Internal,
        })?;
        Ok(call)
    }

    fn complete(
        &self,
        forwarded_id: &CorrelationId,
        responder: &CallTarget,
        outcome: Result<Value, RpcError>,
    ) {
        let Some(call) = self.pending.take(forwarded_id, responder) else {
            tracing::debug!(
                correlation_id = %forwarded_id,
                route = %responder,
                "dropped late gateway result"
            );
            return;
        };
        let reply = match outcome {
            Ok(result) => Envelope::response(call.original_id().clone(), result),
            Err(rpc_error) => Envelope::error(call.original_id().clone(), rpc_error),
        };
        self.deliver_to(call.originator(), reply);
    }

    fn holders_except(&self, capability: &Capability, sender: &AgentId) -> Vec<AgentHandle> {
        self.registry
            .list(Some(capability))
            .into_iter()
            .filter(|handle| handle.id() != sender && handle.status().is_routable())
            .collect()
    }

    fn deliver_to(&self, agent: &AgentId, envelope: Envelope) -> bool {
        let Ok(handle) = self.registry.lookup(agent) else {
            tracing::debug!(agent_id = %agent, "recipient no longer registered");
            return false;
        };
        match handle.deliver(envelope) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(agent_id = %agent, error = %err, "delivery failed");
                false
            }
        }
    }
}
