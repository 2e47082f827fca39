//! QGig real-time channel transport.
//!
//! - [`RealtimeEvent`] -- the envelope pushed to a channel.
//! - [`ChannelTransport`] -- join / leave / publish interface the engines
//!   depend on.
//! - [`ChannelRegistry`] -- process-lifetime registry of live connections and
//!   their room memberships. The WebSocket endpoint owns the sockets; the
//!   registry only holds the outbound queue of each connection.
//! - [`Outbox`] -- pushes collected during a unit of work and flushed after
//!   it commits.

pub mod event;
pub mod outbox;
pub mod registry;
pub mod transport;

pub use event::RealtimeEvent;
pub use outbox::Outbox;
pub use registry::{ChannelRegistry, Outbound};
pub use transport::{ChannelTransport, TransportError};
