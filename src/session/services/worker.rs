//! Transport-agnostic read loop for one agent connection.

use super::{SessionStep, Supervisor};
use crate::registry::ports::AgentConnection;
use crate::session::domain::CloseReason;
use futures_util::{Stream, StreamExt};
use mockable::Clock;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Reads inbound frames until the session closes.
///
/// `frames` yields raw payloads from the transport. `closed` resolves when
/// the outbound half goes away. The session is closed and the agent
/// deregistered before the reason is returned.
pub async fn drive_connection<C, S, E, F>(
    supervisor: Arc<Supervisor<C>>,
    connection: Arc<dyn AgentConnection>,
    mut frames: S,
    closed: F,
) -> CloseReason
where
    C: Clock + Send + Sync + 'static,
    S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
    E: Display,
    F: Future<Output = ()>,
{
    let handshake_deadline = Instant::now() + supervisor.settings().handshake_timeout;
    let mut session = supervisor.open(connection);
    tokio::pin!(closed);

    let reason = loop {
        let registered = session.agent_id().is_some();
        tokio::select! {
            () = &mut closed => break CloseReason::TransportClosed,
            () = tokio::time::sleep_until(handshake_deadline), if !registered => {
                tracing::info!("handshake timed out");
                break CloseReason::HandshakeTimeout;
            }
            frame = frames.next() => match frame {
                Some(Ok(payload)) => {
                    if let SessionStep::Close(reason) = session.receive(&payload).await {
                        break reason;
                    }
                }
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "transport read failed");
                    break CloseReason::TransportClosed;
                }
                None => break CloseReason::TransportClosed,
            },
        }
    };

    session.close(reason);
    reason
}
