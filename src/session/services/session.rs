//! One connection's session: handshake, `agent.*` commands and ingress.

use super::Supervisor;
use crate::envelope::domain::{AgentId, CorrelationId, Envelope, EnvelopeKind, ErrorCode, RpcError};
use crate::registry::{
    domain::{AgentHandle, AgentStatus, Capability},
    ports::AgentConnection,
    services::RegistryError,
};
use crate::router::services::RouterError;
use crate::session::{
    domain::{
        AgentCommand, CloseReason, InvalidSessionTransition, SessionDomainError, SessionState,
    },
    ports::CredentialError,
};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

/// Errors answered to the agent on its own connection.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The agent has not completed `agent.register`.
    #[error("agent.register must come first")]
    HandshakeRequired,

    /// `agent.register` arrived on an already registered session.
    #[error("session is already registered")]
    AlreadyRegistered,

    /// The `agent.*` command could not be parsed.
    #[error(transparent)]
    Command(#[from] SessionDomainError),

    /// The credential verifier refused the handshake.
    #[error(transparent)]
    Unauthorized(#[from] CredentialError),

    /// The registry refused the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The router could not place the envelope.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// The lifecycle does not allow the state change.
    #[error(transparent)]
    Transition(#[from] InvalidSessionTransition),
}

impl SessionError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::HandshakeRequired => ErrorCode::HandshakeRequired,
            Self::AlreadyRegistered => ErrorCode::MalformedMessage,
            Self::Command(SessionDomainError::UnknownCommand(_)) => ErrorCode::MethodNotFound,
            Self::Command(SessionDomainError::InvalidParams(_)) => ErrorCode::InvalidParams,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Registry(err) => err.to_error_code(),
            Self::Router(err) => err.to_error_code(),
            Self::Transition(_) => ErrorCode::Internal,
        }
    }

    /// Builds the wire error object.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Router(err) => err.to_rpc_error(),
            Self::Transition(_) => RpcError::from_code(self.to_error_code()),
            other => RpcError::from_code(other.to_error_code()).with_detail(other.to_string()),
        }
    }
}

/// What the connection worker should do after an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Keep reading.
    Continue,
    /// Close the session for the given reason.
    Close(CloseReason),
}

/// State of one agent connection.
pub struct Session<C>
where
    C: Clock + Send + Sync + 'static,
{
    supervisor: Arc<Supervisor<C>>,
    connection: Arc<dyn AgentConnection>,
    state: SessionState,
    agent: Option<AgentId>,
}

impl<C> Session<C>
where
    C: Clock + Send + Sync + 'static,
{
    pub(super) fn new(supervisor: Arc<Supervisor<C>>, connection: Arc<dyn AgentConnection>) -> Self {
        Self {
            supervisor,
            connection,
            state: SessionState::Connecting,
            agent: None,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the registered agent, once the handshake succeeded.
    #[must_use]
    pub const fn agent_id(&self) -> Option<&AgentId> {
        self.agent.as_ref()
    }

    /// Decodes and handles one raw inbound payload.
    pub async fn receive(&mut self, payload: &[u8]) -> SessionStep {
        if let Some(step) = self.refresh_liveness() {
            return step;
        }
        match self.supervisor.codec().decode(payload) {
            Ok(envelope) => self.handle(envelope).await,
            Err(malformed) => {
                tracing::debug!(
                    agent_id = self.agent.as_ref().map(AgentId::as_str),
                    error = %malformed,
                    "malformed message"
                );
                if let Some(id) = malformed.correlation_id() {
                    self.send(Envelope::error(id.clone(), malformed.to_rpc_error()));
                }
                SessionStep::Continue
            }
        }
    }

    /// Handles one decoded inbound envelope.
    pub async fn handle(&mut self, envelope: Envelope) -> SessionStep {
        let is_call = matches!(
            envelope.kind(),
            EnvelopeKind::Request | EnvelopeKind::Notification
        );
        if is_call && envelope.method().is_some_and(AgentCommand::is_agent_method) {
            return self.handle_command(&envelope).await;
        }

        let Some(agent) = self.agent.clone().filter(|_| self.state.is_registered()) else {
            self.answer_error(envelope.id(), &SessionError::HandshakeRequired);
            return SessionStep::Continue;
        };

        let kind = envelope.kind();
        let id = envelope.id().cloned();
        if let Err(err) = self.supervisor.router().dispatch(envelope.with_sender(agent)) {
            tracing::debug!(error = %err, "request not routed");
            if kind == EnvelopeKind::Request {
                self.answer_error(id.as_ref(), &SessionError::Router(err));
            }
        }
        SessionStep::Continue
    }

    /// Moves the session to `closed`, deregistering the agent if needed.
    pub fn close(&mut self, reason: CloseReason) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        if let Some(agent) = &self.agent {
            match self
                .supervisor
                .registry()
                .deregister_connection(agent, &self.connection, reason.deregistration_reason())
            {
                Ok(_) | Err(RegistryError::UnknownAgent(_)) => {}
                Err(err) => tracing::warn!(agent_id = %agent, error = %err, "deregistration failed"),
            }
        }
        self.connection.close(reason.as_str());
        tracing::info!(
            agent_id = self.agent.as_ref().map(AgentId::as_str),
            reason = %reason,
            "session closed"
        );
    }

    async fn handle_command(&mut self, envelope: &Envelope) -> SessionStep {
        let id = envelope.id();
        let method = envelope.method().unwrap_or_default();
        let command = match AgentCommand::parse(method, envelope.params()) {
            Ok(command) => command,
            Err(err) => {
                self.answer_error(id, &SessionError::Command(err));
                return SessionStep::Continue;
            }
        };

        if let AgentCommand::Register {
            agent_id,
            capabilities,
            credentials,
        } = command
        {
            return match self
                .register(agent_id, capabilities, credentials.as_deref())
                .await
            {
                Ok(result) => {
                    self.answer(id, result);
                    SessionStep::Continue
                }
                Err(SessionError::AlreadyRegistered) => {
                    self.answer_error(id, &SessionError::AlreadyRegistered);
                    SessionStep::Continue
                }
                Err(err) => {
                    tracing::info!(error = %err, "handshake refused");
                    self.answer_error(id, &err);
                    SessionStep::Close(CloseReason::HandshakeRejected)
                }
            };
        }

        let Some(agent) = self.agent.clone().filter(|_| self.state.is_registered()) else {
            self.answer_error(id, &SessionError::HandshakeRequired);
            return SessionStep::Continue;
        };

        let outcome = match command {
            AgentCommand::Heartbeat => self.heartbeat(&agent),
            AgentCommand::UpdateCapabilities { capabilities } => self
                .supervisor
                .registry()
                .update_capabilities(&agent, capabilities)
                .map(|handle| {
                    json!({
                        "agent_id": handle.id(),
                        "capabilities": handle.capabilities(),
                    })
                })
                .map_err(SessionError::from),
            AgentCommand::List { capability } => Ok(self.list(capability.as_ref())),
            AgentCommand::Disconnect => {
                self.answer(id, json!({"status": SessionState::Closed.as_str()}));
                return SessionStep::Close(CloseReason::Disconnect);
            }
            AgentCommand::Register { .. } => Err(SessionError::AlreadyRegistered),
        };

        match outcome {
            Ok(result) => self.answer(id, result),
            Err(err) => self.answer_error(id, &err),
        }
        SessionStep::Continue
    }

    async fn register(
        &mut self,
        agent_id: AgentId,
        capabilities: Vec<Capability>,
        credentials: Option<&str>,
    ) -> Result<Value, SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::AlreadyRegistered);
        }
        self.supervisor
            .verifier()
            .verify(&agent_id, credentials)
            .await?;
        let handle = self.supervisor.registry().register(
            agent_id.clone(),
            capabilities,
            Arc::clone(&self.connection),
        )?;
        self.state = self.state.transition(SessionState::Active)?;
        self.agent = Some(agent_id);

        let interval_ms = self
            .supervisor
            .registry()
            .heartbeat_interval()
            .num_milliseconds();
        tracing::info!(
            agent_id = %handle.id(),
            capabilities = handle.capabilities().len(),
            "session registered"
        );
        Ok(json!({
            "agent_id": handle.id(),
            "status": handle.status().as_str(),
            "heartbeat_interval_ms": interval_ms,
        }))
    }

    fn heartbeat(&mut self, agent: &AgentId) -> Result<Value, SessionError> {
        let handle = self.supervisor.registry().heartbeat(agent)?;
        self.sync_state(&handle)?;
        Ok(json!({"status": handle.status().as_str()}))
    }

    fn list(&self, capability: Option<&Capability>) -> Value {
        let agents: Vec<Value> = self
            .supervisor
            .registry()
            .list(capability)
            .iter()
            .map(|handle| {
                json!({
                    "id": handle.id(),
                    "status": handle.status().as_str(),
                    "capabilities": handle.capabilities(),
                })
            })
            .collect();
        json!({"agents": agents})
    }

    fn refresh_liveness(&mut self) -> Option<SessionStep> {
        if !self.state.is_registered() {
            return None;
        }
        let agent = self.agent.as_ref()?;
        match self.supervisor.registry().lookup(agent) {
            Ok(handle) if handle.is_bound_to(&self.connection) => {
                if let Err(err) = self.sync_state(&handle) {
                    tracing::warn!(error = %err, "session state out of sync");
                }
                None
            }
            _ => Some(SessionStep::Close(CloseReason::HeartbeatExpired)),
        }
    }

    fn sync_state(&mut self, handle: &AgentHandle) -> Result<(), InvalidSessionTransition> {
        let wanted = match handle.status() {
            AgentStatus::Degraded => SessionState::Degraded,
            AgentStatus::Active => SessionState::Active,
            AgentStatus::Connecting | AgentStatus::Disconnected => return Ok(()),
        };
        if wanted != self.state {
            self.state = self.state.transition(wanted)?;
            tracing::info!(agent_id = %handle.id(), state = %self.state, "session state changed");
        }
        Ok(())
    }

    fn answer(&self, id: Option<&CorrelationId>, result: Value) {
        if let Some(correlation_id) = id {
            self.send(Envelope::response(correlation_id.clone(), result));
        }
    }

    fn answer_error(&self, id: Option<&CorrelationId>, err: &SessionError) {
        if let Some(correlation_id) = id {
            self.send(Envelope::error(correlation_id.clone(), err.to_rpc_error()));
        }
    }

    fn send(&self, envelope: Envelope) {
        if let Err(err) = self.connection.deliver(envelope) {
            tracing::debug!(error = %err, "reply not delivered");
        }
    }
}
