//! Server-directed `agent.*` commands.

use super::SessionDomainError;
use crate::envelope::domain::AgentId;
use crate::registry::domain::Capability;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;

/// Method namespace handled by the session instead of the router.
pub const AGENT_NAMESPACE: &str = "agent.";

const REGISTER: &str = "agent.register";
const HEARTBEAT: &str = "agent.heartbeat";
const UPDATE_CAPABILITIES: &str = "agent.updateCapabilities";
const LIST: &str = "agent.list";
const DISCONNECT: &str = "agent.disconnect";

/// A parsed `agent.*` command.
#[derive(Clone, PartialEq, Eq)]
pub enum AgentCommand {
    /// Handshake and capability declaration.
    Register {
        /// Identifier the agent claims.
        agent_id: AgentId,
        /// Declared capabilities.
        capabilities: Vec<Capability>,
        /// Opaque credentials for the verifier.
        credentials: Option<String>,
    },
    /// Liveness signal.
    Heartbeat,
    /// Replace the declared capabilities.
    UpdateCapabilities {
        /// New capability set.
        capabilities: Vec<Capability>,
    },
    /// List registered agents.
    List {
        /// Only agents serving this capability.
        capability: Option<Capability>,
    },
    /// Close the session.
    Disconnect,
}

impl fmt::Debug for AgentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register {
                agent_id,
                capabilities,
                credentials,
            } => f
                .debug_struct("Register")
                .field("agent_id", agent_id)
                .field("capabilities", capabilities)
                .field("credentials", &credentials.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Heartbeat => f.write_str("Heartbeat"),
            Self::UpdateCapabilities { capabilities } => f
                .debug_struct("UpdateCapabilities")
                .field("capabilities", capabilities)
                .finish(),
            Self::List { capability } => {
                f.debug_struct("List").field("capability", capability).finish()
            }
            Self::Disconnect => f.write_str("Disconnect"),
        }
    }
}

#[derive(Deserialize)]
struct RegisterParams {
    agent_id: String,
    #[serde(default)]
    capabilities: Vec<String>,
    credentials: Option<String>,
}

#[derive(Deserialize)]
struct CapabilitiesParams {
    capabilities: Vec<String>,
}

#[derive(Deserialize)]
struct ListParams {
    capability: Option<String>,
}

fn decode<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, SessionDomainError> {
    let payload = params.cloned().unwrap_or_else(|| json!({}));
    serde_json::from_value(payload).map_err(|err| SessionDomainError::InvalidParams(err.to_string()))
}

fn capabilities(names: Vec<String>) -> Result<Vec<Capability>, SessionDomainError> {
    Capability::parse_all(names).map_err(|err| SessionDomainError::InvalidParams(err.to_string()))
}

impl AgentCommand {
    /// Every method name handled by the session.
    pub const METHODS: [&'static str; 5] = [REGISTER, HEARTBEAT, UPDATE_CAPABILITIES, LIST, DISCONNECT];

    /// Returns whether `method` belongs to the `agent.*` namespace.
    #[must_use]
    pub fn is_agent_method(method: &str) -> bool {
        method.starts_with(AGENT_NAMESPACE)
    }

    /// Parses an `agent.*` method and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::UnknownCommand`] for unknown methods
    /// and [`SessionDomainError::InvalidParams`] for malformed parameters.
    pub fn parse(method: &str, params: Option<&Value>) -> Result<Self, SessionDomainError> {
        match method {
            REGISTER => {
                let raw: RegisterParams = decode(params)?;
                let agent_id = AgentId::new(raw.agent_id)
                    .map_err(|err| SessionDomainError::InvalidParams(err.to_string()))?;
                Ok(Self::Register {
                    agent_id,
                    capabilities: capabilities(raw.capabilities)?,
                    credentials: raw.credentials,
                })
            }
            HEARTBEAT => Ok(Self::Heartbeat),
            UPDATE_CAPABILITIES => {
                let raw: CapabilitiesParams = decode(params)?;
                Ok(Self::UpdateCapabilities {
                    capabilities: capabilities(raw.capabilities)?,
                })
            }
            LIST => {
                let raw: ListParams = decode(params)?;
                let capability = raw
                    .capability
                    .map(Capability::new)
                    .transpose()
                    .map_err(|err| SessionDomainError::InvalidParams(err.to_string()))?;
                Ok(Self::List { capability })
            }
            DISCONNECT => Ok(Self::Disconnect),
            other => Err(SessionDomainError::UnknownCommand(other.to_owned())),
        }
    }

    /// Returns the method name of the command.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Register { .. } => REGISTER,
            Self::Heartbeat => HEARTBEAT,
            Self::UpdateCapabilities { .. } => UPDATE_CAPABILITIES,
            Self::List { .. } => LIST,
            Self::Disconnect => DISCONNECT,
        }
    }
}
