//! Length-prefixed TCP transport.
//!
//! Every frame is a 4-byte big-endian length followed by that many bytes
//! of JSON. A frame above the payload limit ends the connection.

use crate::envelope::codec::EnvelopeCodec;
use crate::registry::adapters::{ChannelConnection, Outbound};
use crate::server::TransportError;
use crate::session::{
    domain::CloseReason,
    services::{Supervisor, drive_connection},
};
use futures_util::{Stream, stream};
use mockable::Clock;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};

/// Reads one frame.
///
/// Returns `Ok(None)` on a clean end of stream before a length prefix.
///
/// # Errors
///
/// Returns [`TransportError::FrameTooLarge`] when the declared length
/// exceeds `limit`, and [`TransportError::Io`] on read failures or a
/// truncated payload.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let declared = match reader.read_u32().await {
        Ok(length) => length,
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let size = usize::try_from(declared)
        .ok()
        .filter(|size| *size <= limit)
        .ok_or(TransportError::FrameTooLarge {
            length: u64::from(declared),
            limit,
        })?;
    let mut payload = vec![0_u8; size];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Writes one frame and flushes.
///
/// # Errors
///
/// Returns [`TransportError::FrameTooLarge`] when the payload does not fit
/// a 32-bit length, and [`TransportError::Io`] on write failures.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let length = u32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        length: u64::try_from(payload.len()).unwrap_or(u64::MAX),
        limit: usize::try_from(u32::MAX).unwrap_or(usize::MAX),
    })?;
    writer.write_u32(length).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

fn frames<R>(reader: R, limit: usize) -> impl Stream<Item = Result<Vec<u8>, TransportError>>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(reader), move |state| async move {
        let mut reader = state?;
        match read_frame(&mut reader, limit).await {
            Ok(Some(payload)) => Some((Ok(payload), Some(reader))),
            Ok(None) => None,
            Err(err) => Some((Err(err), None)),
        }
    })
}

async fn write_outbound<W>(
    mut writer: W,
    mut outbound: UnboundedReceiver<Outbound>,
    codec: EnvelopeCodec,
    finished: oneshot::Sender<()>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Envelope(envelope) => {
                if let Err(err) = write_frame(&mut writer, &codec.encode(&envelope)).await {
                    tracing::debug!(error = %err, "tcp write failed");
                    break;
                }
            }
            Outbound::Close(reason) => {
                tracing::debug!(reason, "closing tcp connection");
                if let Err(err) = writer.shutdown().await {
                    tracing::debug!(error = %err, "tcp shutdown failed");
                }
                break;
            }
        }
    }
    if finished.send(()).is_err() {
        tracing::trace!("reader finished before the writer");
    }
}

/// Serves one agent over a length-prefixed TCP stream.
pub async fn serve_tcp<C>(supervisor: Arc<Supervisor<C>>, stream: TcpStream) -> CloseReason
where
    C: Clock + Send + Sync + 'static,
{
    let codec = *supervisor.codec();
    let (reader, writer) = stream.into_split();
    let (connection, outbound) = ChannelConnection::new();
    let (finished_tx, finished_rx) = oneshot::channel();
    let writer_task = tokio::spawn(write_outbound(writer, outbound, codec, finished_tx));

    let inbound = Box::pin(frames(reader, codec.max_message_bytes()));
    let reason = drive_connection(supervisor, Arc::new(connection), inbound, async move {
        let _writer_gone = finished_rx.await;
    })
    .await;

    if let Err(err) = writer_task.await {
        tracing::debug!(error = %err, "tcp writer task failed");
    }
    reason
}
