//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token generation/validation and session-token helpers.
//! - [`roles`] -- the role resolver: assigned roles, active role, switching,
//!   and authorization against persisted assignments.

pub mod jwt;
pub mod password;
pub mod roles;
