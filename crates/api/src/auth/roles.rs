//! Role resolver.
//!
//! A user holds a set of assigned roles (persisted role assignments) and
//! operates as exactly one active role at a time. The active role is read
//! from, in order: the bearer credential's explicit claim, the server-side
//! session, and finally the legacy single-role column. Authorization always
//! re-checks the active role against the persisted assignments, so a stale
//! or forged claim cannot outlive a revocation.

use std::collections::BTreeSet;
use std::str::FromStr;

use qgig_core::error::AccessDenied;
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;
use qgig_db::models::role::CreateRoleSwitchAudit;
use qgig_db::store::StoreResult;
use qgig_db::StoreTx;

use crate::error::AppResult;
use crate::middleware::auth::{AuthContext, ClientMeta};

/// Implicit roles of a user that has no role assignment rows yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyRolePolicy {
    /// Both market roles, plus admin for legacy admins.
    #[default]
    Both,
    /// Only the legacy single role.
    LegacyOnly,
}

impl FromStr for LegacyRolePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "legacy_only" => Ok(Self::LegacyOnly),
            other => Err(format!(
                "Unknown legacy role policy '{other}'. Must be one of: both, legacy_only"
            )),
        }
    }
}

/// Outcome of a successful role switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSwitch {
    pub from: Option<RoleName>,
    pub to: RoleName,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleResolver {
    policy: LegacyRolePolicy,
}

impl RoleResolver {
    pub fn new(policy: LegacyRolePolicy) -> Self {
        Self { policy }
    }

    /// Roles treated as assigned to a user without assignment rows.
    pub fn implicit_roles(&self, legacy_role: RoleName) -> BTreeSet<RoleName> {
        let mut roles = BTreeSet::new();
        match self.policy {
            LegacyRolePolicy::Both => {
                roles.extend(RoleName::MARKET_ROLES);
                if legacy_role == RoleName::Admin {
                    roles.insert(RoleName::Admin);
                }
            }
            LegacyRolePolicy::LegacyOnly => {
                roles.insert(legacy_role);
            }
        }
        roles
    }

    /// Roles the user currently holds.
    pub async fn assigned_roles(
        &self,
        tx: &mut dyn StoreTx,
        user_id: DbId,
        legacy_role: RoleName,
    ) -> StoreResult<BTreeSet<RoleName>> {
        let persisted = tx.list_user_roles(user_id).await?;
        if persisted.is_empty() {
            return Ok(self.implicit_roles(legacy_role));
        }
        Ok(persisted.into_iter().collect())
    }

    /// Persist the implicit roles of a user that has no assignment rows.
    ///
    /// Returns the roles the user holds afterwards.
    pub async fn backfill(
        &self,
        tx: &mut dyn StoreTx,
        user_id: DbId,
        legacy_role: RoleName,
    ) -> StoreResult<BTreeSet<RoleName>> {
        let persisted = tx.list_user_roles(user_id).await?;
        if !persisted.is_empty() {
            return Ok(persisted.into_iter().collect());
        }
        let roles = self.implicit_roles(legacy_role);
        for role in &roles {
            tx.assign_role(user_id, *role).await?;
        }
        tracing::info!(user_id, roles = ?roles, "Backfilled role assignments");
        Ok(roles)
    }

    /// The role the caller is operating as.
    ///
    /// An explicit claim that does not name a known role is not silently
    /// replaced by a fallback; it resolves to [`AccessDenied::NoActiveRole`].
    pub fn active_role(ctx: &AuthContext) -> Result<RoleName, AccessDenied> {
        if let Some(claim) = &ctx.claimed_role {
            return claim.parse().map_err(|_| AccessDenied::NoActiveRole);
        }
        ctx.session_role
            .or(ctx.legacy_role)
            .ok_or(AccessDenied::NoActiveRole)
    }

    /// Check that the caller's active role is one of `required` and is
    /// genuinely assigned. Returns the active role.
    pub async fn authorize(
        &self,
        tx: &mut dyn StoreTx,
        ctx: &AuthContext,
        required: &[RoleName],
    ) -> AppResult<RoleName> {
        let active = Self::active_role(ctx)?;
        if !required.contains(&active) {
            return Err(AccessDenied::RoleNotPermitted { active }.into());
        }
        let legacy = ctx.legacy_role.unwrap_or(active);
        let assigned = self.assigned_roles(tx, ctx.user_id, legacy).await?;
        if !assigned.contains(&active) {
            tracing::warn!(
                user_id = ctx.user_id,
                role = %active,
                "Active role is not assigned to the user",
            );
            return Err(AccessDenied::RoleNotAssigned(active).into());
        }
        Ok(active)
    }

    /// Switch the caller's active role to `target`.
    ///
    /// Records an audit entry even when `target` is already active, and
    /// writes the new role into the backing session when there is one.
    pub async fn switch_active_role(
        &self,
        tx: &mut dyn StoreTx,
        ctx: &AuthContext,
        target: RoleName,
        meta: &ClientMeta,
    ) -> AppResult<RoleSwitch> {
        let legacy = ctx.legacy_role.unwrap_or(target);
        let assigned = self.assigned_roles(tx, ctx.user_id, legacy).await?;
        if !assigned.contains(&target) {
            return Err(AccessDenied::RoleNotAssigned(target).into());
        }
        if !target.is_switchable() {
            return Err(AccessDenied::NonSwitchableRole(target).into());
        }

        let from = Self::active_role(ctx).ok();
        tx.record_role_switch(&CreateRoleSwitchAudit {
            user_id: ctx.user_id,
            from_role: from,
            to_role: target,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        })
        .await?;

        if let Some(session_id) = ctx.session_id {
            tx.set_session_active_role(session_id, target).await?;
        }

        tracing::info!(
            user_id = ctx.user_id,
            from = ?from,
            to = %target,
            "Active role switched",
        );
        Ok(RoleSwitch { from, to: target })
    }
}
