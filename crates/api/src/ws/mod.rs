//! WebSocket infrastructure for real-time communication.
//!
//! The socket endpoint authenticates before upgrading, registers the
//! connection with the shared [`qgig_events::ChannelRegistry`] and joins the
//! caller's personal and role channels. Outbound frames come from engines via
//! the outbox; inbound frames are parsed by [`protocol`].

mod handler;
mod heartbeat;
pub mod protocol;

pub use handler::{handle_inbound, open_connection, plan_connection, ws_handler, ConnectionPlan};
pub use heartbeat::start_heartbeat;
