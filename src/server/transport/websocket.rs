//! WebSocket transport: one envelope per text frame.

use crate::envelope::codec::EnvelopeCodec;
use crate::registry::adapters::{ChannelConnection, Outbound};
use crate::server::TransportError;
use crate::session::{
    domain::CloseReason,
    services::{Supervisor, drive_connection},
};
use futures_util::{Sink, SinkExt, StreamExt, future};
use mockable::Clock;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};
use tokio_tungstenite::tungstenite::{
    self, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};

fn inbound_frame(
    message: Result<Message, tungstenite::Error>,
) -> Option<Result<Vec<u8>, TransportError>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text.into_bytes())),
        Ok(Message::Binary(bytes)) => Some(Ok(bytes)),
        Ok(Message::Close(_)) => Some(Err(TransportError::PeerClosed)),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(err) => Some(Err(err.into())),
    }
}

async fn write_outbound<S>(
    mut sink: S,
    mut outbound: UnboundedReceiver<Outbound>,
    codec: EnvelopeCodec,
    finished: oneshot::Sender<()>,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Envelope(envelope) => {
                let frame = Message::Text(codec.encode_to_string(&envelope));
                if let Err(err) = sink.send(frame).await {
                    tracing::debug!(error = %err, "websocket write failed");
                    break;
                }
            }
            Outbound::Close(reason) => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: reason.into(),
                };
                if let Err(err) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!(error = %err, "websocket close failed");
                }
                break;
            }
        }
    }
    if finished.send(()).is_err() {
        tracing::trace!("reader finished before the writer");
    }
}

/// Upgrades `stream` and serves one agent over WebSocket.
///
/// # Errors
///
/// Returns [`TransportError::WebSocket`] when the upgrade handshake fails.
pub async fn serve_websocket<C>(
    supervisor: Arc<Supervisor<C>>,
    stream: TcpStream,
) -> Result<CloseReason, TransportError>
where
    C: Clock + Send + Sync + 'static,
{
    let socket = tokio_tungstenite::accept_async(stream).await?;
    let codec = *supervisor.codec();
    let (sink, source) = socket.split();
    let (connection, outbound) = ChannelConnection::new();
    let (finished_tx, finished_rx) = oneshot::channel();
    let writer_task = tokio::spawn(write_outbound(sink, outbound, codec, finished_tx));

    let inbound = source.filter_map(|message| future::ready(inbound_frame(message)));
    let reason = drive_connection(supervisor, Arc::new(connection), inbound, async move {
        let _writer_gone = finished_rx.await;
    })
    .await;

    if let Err(err) = writer_task.await {
        tracing::debug!(error = %err, "websocket writer task failed");
    }
    Ok(reason)
}
