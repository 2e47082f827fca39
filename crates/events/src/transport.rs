//! The interface engines use to reach connected clients.

use async_trait::async_trait;
use qgig_core::channels::ChannelKey;

use crate::event::RealtimeEvent;

/// Error type for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection id is not registered (never connected or already gone).
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// The event payload could not be encoded as a text frame.
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Best-effort, at-most-once delivery to channel members.
///
/// Publishing to a channel with no members is not an error; it returns
/// `Ok(0)`.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn join(&self, conn_id: &str, channel: ChannelKey) -> Result<(), TransportError>;

    async fn leave(&self, conn_id: &str, channel: ChannelKey) -> Result<(), TransportError>;

    /// Queue the event for every member of its channel. Returns the number
    /// of connections it was queued on.
    async fn publish(&self, event: &RealtimeEvent) -> Result<usize, TransportError>;
}
