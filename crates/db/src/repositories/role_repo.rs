//! Repository for `roles`, `user_roles` and `role_switch_audit`.

use qgig_core::roles::RoleName;
use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::role::{CreateRoleSwitchAudit, Role, RoleSwitchAudit};

const ROLE_COLUMNS: &str = "id, name, is_switchable, created_at, updated_at";

const AUDIT_COLUMNS: &str =
    "id, user_id, from_role, to_role, ip_address, user_agent, created_at, updated_at";

/// Provides role lookup, assignment and switch auditing.
pub struct RoleRepo;

impl RoleRepo {
    /// Look up a role by name.
    pub async fn find_by_name(
        conn: &mut PgConnection,
        name: RoleName,
    ) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Names of every role assigned to a user.
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<RoleName>, sqlx::Error> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT r.name FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = $1
             ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        // Unrecognised names are skipped.
        Ok(names.into_iter().filter_map(|n| n.parse().ok()).collect())
    }

    /// Assign a role to a user. Returns `false` if it was already assigned.
    pub async fn assign(
        conn: &mut PgConnection,
        user_id: DbId,
        role: RoleName,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = $2
             ON CONFLICT ON CONSTRAINT uq_user_roles_user_id_role_id DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a role-switch audit entry.
    pub async fn record_switch(
        conn: &mut PgConnection,
        input: &CreateRoleSwitchAudit,
    ) -> Result<RoleSwitchAudit, sqlx::Error> {
        let query = format!(
            "INSERT INTO role_switch_audit (user_id, from_role, to_role, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {AUDIT_COLUMNS}"
        );
        sqlx::query_as::<_, RoleSwitchAudit>(&query)
            .bind(input.user_id)
            .bind(input.from_role.map(RoleName::as_str))
            .bind(input.to_role.as_str())
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .fetch_one(conn)
            .await
    }

    /// Audit history for a user, newest first.
    pub async fn list_switches(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<RoleSwitchAudit>, sqlx::Error> {
        let query = format!(
            "SELECT {AUDIT_COLUMNS} FROM role_switch_audit
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, RoleSwitchAudit>(&query)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }
}
