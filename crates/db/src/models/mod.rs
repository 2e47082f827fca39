//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Create DTOs for inserts
//! - Update DTOs (all `Option` fields) where rows are patched

pub mod document;
pub mod interest;
pub mod job;
pub mod message;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod rating;
pub mod role;
pub mod session;
pub mod user;
