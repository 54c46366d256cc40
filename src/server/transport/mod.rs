//! Agent transports.
//!
//! Each accepted connection gets one task reading frames into its session
//! and one writer task draining the connection's outbound channel.

pub mod tcp;
pub mod websocket;

pub use tcp::{read_frame, serve_tcp, write_frame};
pub use websocket::serve_websocket;
