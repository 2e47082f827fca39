//! Server-side session model.

use qgig_core::roles::RoleName;
use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Active role recorded server-side, if any.
    pub active_role: Option<String>,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    /// Parsed active role. Unknown values are treated as absent.
    pub fn active_role(&self) -> Option<RoleName> {
        self.active_role.as_deref().and_then(|r| r.parse().ok())
    }
}

/// DTO for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub token_hash: String,
    pub active_role: Option<RoleName>,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
