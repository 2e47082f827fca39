pub mod admin;
pub mod auth;
pub mod documents;
pub mod interests;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod ratings;

use qgig_core::error::CoreError;
use qgig_core::roles::RoleName;

use crate::error::AppResult;

/// Parse a role name from a request body.
pub(crate) fn parse_role(raw: &str) -> AppResult<RoleName> {
    raw.parse().map_err(|e: String| CoreError::Validation(e).into())
}
