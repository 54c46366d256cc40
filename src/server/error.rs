//! Transport and listener errors.

use std::io;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised by listeners and per-connection transports.
///
/// Only bind failures are fatal; every other variant ends one connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested socket address.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The WebSocket handshake or framing failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),

    /// A socket read or write failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// A length-prefixed frame exceeded the payload limit.
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Declared frame length.
        length: u64,
        /// Configured limit.
        limit: usize,
    },

    /// The peer sent a close frame.
    #[error("peer closed the connection")]
    PeerClosed,

    /// The health endpoint stopped with an error.
    #[error("health endpoint failed: {0}")]
    Health(#[source] io::Error),
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
