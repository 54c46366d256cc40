//! Verifier backed by a fixed agent → token table.

use crate::envelope::domain::AgentId;
use crate::session::ports::{CredentialError, CredentialVerifier};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

type TokenDigest = [u8; 32];

/// Accepts an agent only when it presents its configured token.
///
/// Tokens are kept as SHA-256 digests and compared digest to digest.
#[derive(Clone, Default)]
pub struct StaticTokenVerifier {
    digests: BTreeMap<AgentId, TokenDigest>,
}

impl StaticTokenVerifier {
    /// Creates a verifier from `(agent, token)` pairs.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = (AgentId, String)>) -> Self {
        Self {
            digests: tokens
                .into_iter()
                .map(|(agent, token)| (agent, digest(&token)))
                .collect(),
        }
    }

    /// Returns the number of agents with a token.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns whether no agent has a token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

fn digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

impl fmt::Debug for StaticTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenVerifier")
            .field("agents", &self.digests.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for StaticTokenVerifier {
    async fn verify(&self, agent_id: &AgentId, credentials: Option<&str>) -> Result<(), CredentialError> {
        let presented = credentials.ok_or_else(|| CredentialError::Missing(agent_id.clone()))?;
        match self.digests.get(agent_id) {
            Some(expected) if *expected == digest(presented) => Ok(()),
            _ => Err(CredentialError::Rejected(agent_id.clone())),
        }
    }
}
