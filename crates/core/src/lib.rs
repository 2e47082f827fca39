//! Pure domain rules for the QGig marketplace.
//!
//! Nothing in this crate performs I/O. The state machines, role names,
//! channel keys and notification wording defined here are shared by the
//! persistence layer, the real-time transport and the API server.

pub mod channels;
pub mod documents;
pub mod error;
pub mod jobs;
pub mod lifecycle;
pub mod messages;
pub mod notifications;
pub mod pagination;
pub mod payments;
pub mod ratings;
pub mod roles;
pub mod types;
