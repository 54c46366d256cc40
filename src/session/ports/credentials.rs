//! Credential verification port consulted during the handshake.

use crate::envelope::domain::AgentId;
use async_trait::async_trait;
use thiserror::Error;

/// Reasons a handshake is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The agent sent no credentials but the verifier needs some.
    #[error("credentials required for agent {0}")]
    Missing(AgentId),

    /// The credentials do not match the agent.
    #[error("credentials rejected for agent {0}")]
    Rejected(AgentId),
}

/// Decides whether an agent may register.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Checks the credentials presented by `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the handshake must be refused.
    async fn verify(&self, agent_id: &AgentId, credentials: Option<&str>) -> Result<(), CredentialError>;
}
