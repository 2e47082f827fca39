//! Notification dispatch.
//!
//! [`dispatcher`] turns lifecycle events into durable notification rows and
//! queues the matching real-time push on the unit of work's outbox.

pub mod dispatcher;
