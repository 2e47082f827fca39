//! Role, role assignment and role-switch audit models.

use qgig_core::roles::RoleName;
use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `roles` lookup table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub name: RoleName,
    pub is_switchable: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `role_switch_audit` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoleSwitchAudit {
    pub id: DbId,
    pub user_id: DbId,
    pub from_role: Option<String>,
    pub to_role: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a role switch.
#[derive(Debug, Clone)]
pub struct CreateRoleSwitchAudit {
    pub user_id: DbId,
    pub from_role: Option<RoleName>,
    pub to_role: RoleName,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
