//! Connection adapters for the agent registry.

pub mod channel;
pub mod recording;

pub use channel::{ChannelConnection, Outbound};
pub use recording::RecordingConnection;
