//! Verifier accepting every handshake.

use crate::envelope::domain::AgentId;
use crate::session::ports::{CredentialError, CredentialVerifier};
use async_trait::async_trait;

/// Accepts every agent regardless of credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllVerifier;

#[async_trait]
impl CredentialVerifier for AllowAllVerifier {
    async fn verify(&self, _agent_id: &AgentId, _credentials: Option<&str>) -> Result<(), CredentialError> {
        Ok(())
    }
}
