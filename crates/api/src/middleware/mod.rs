//! Authentication and authorization extractors.
//!
//! - [`auth::AuthContext`] -- the authenticated caller, from a Bearer JWT or
//!   the `qgig_session` cookie.
//! - [`rbac::RequireProfessional`], [`rbac::RequireInstitution`],
//!   [`rbac::RequireAdmin`], [`rbac::RequireMarketRole`] -- require an
//!   active role that is also persisted as assigned.

pub mod auth;
pub mod rbac;
