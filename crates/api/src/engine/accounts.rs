//! Registration, login, sessions and role switching.

use std::collections::BTreeSet;

use chrono::Utc;
use qgig_core::error::{AccessDenied, CoreError, StateConflict};
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;
use qgig_db::models::session::CreateSession;
use qgig_db::models::user::{CreateUser, User, UserResponse};
use qgig_db::store::constraints;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::uow::{conflict_on, UnitOfWork};
use crate::auth::jwt::{generate_access_token, generate_session_token};
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::roles::RoleResolver;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthContext, ClientMeta};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 80, message = "Username must be 1-80 characters"))]
    pub username: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Opaque session token, also set as the session cookie.
    pub session_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub active_role: RoleName,
    pub roles: BTreeSet<RoleName>,
    pub user: UserResponse,
}

/// Returned by `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub active_role: Option<RoleName>,
    pub roles: BTreeSet<RoleName>,
    pub professional_id: Option<DbId>,
    pub institution_id: Option<DbId>,
}

/// Returned by `POST /auth/switch-role`.
#[derive(Debug, Serialize)]
pub struct SwitchRoleResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub previous_role: Option<RoleName>,
    pub active_role: RoleName,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignment {
    pub user_id: DbId,
    pub role: RoleName,
    /// False when the user already held the role.
    pub created: bool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::InternalError(format!("Token generation error: {e}"))
}

async fn find_user(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<User> {
    uow.tx.find_user(user_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into()
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create an account holding both market roles and both empty profiles.
pub async fn register(uow: &mut UnitOfWork, input: &RegisterRequest) -> AppResult<UserResponse> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ))
        .into());
    }

    let email = normalize_email(&input.email);
    if uow.tx.find_user_by_email(&email).await?.is_some() {
        return Err(StateConflict::EmailTaken.into());
    }

    let username = input
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = uow
        .tx
        .create_user(&CreateUser {
            email,
            username: username.clone(),
            password_hash,
            role: RoleName::Professional,
        })
        .await
        .map_err(conflict_on(constraints::USERS_EMAIL, StateConflict::EmailTaken))?;

    uow.tx.create_professional(user.id, &username).await?;
    uow.tx.create_institution(user.id, &username).await?;
    for role in RoleName::MARKET_ROLES {
        uow.tx.assign_role(user.id, role).await?;
    }

    tracing::info!(user_id = user.id, "User registered");
    Ok(UserResponse::from(&user))
}

/// Verify credentials and open a server-side session.
pub async fn login(
    uow: &mut UnitOfWork,
    state: &AppState,
    input: &LoginRequest,
    meta: &ClientMeta,
) -> AppResult<AuthResponse> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = uow
        .tx
        .find_user_by_email(&normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AccessDenied::AccountDisabled.into());
    }

    uow.tx.record_login(user.id).await?;
    state
        .resolver
        .backfill(uow.tx.as_mut(), user.id, user.role)
        .await?;
    let roles = state
        .resolver
        .assigned_roles(uow.tx.as_mut(), user.id, user.role)
        .await?;

    let jwt = &state.config.jwt;
    let (session_token, token_hash) = generate_session_token();
    let session = uow
        .tx
        .create_session(&CreateSession {
            user_id: user.id,
            token_hash,
            active_role: Some(user.role),
            expires_at: Utc::now() + chrono::Duration::days(jwt.session_expiry_days),
            user_agent: meta.user_agent.clone(),
            ip_address: meta.ip_address.clone(),
        })
        .await?;

    let access_token =
        generate_access_token(user.id, user.role, Some(user.role), Some(session.id), jwt)
            .map_err(token_error)?;

    tracing::info!(user_id = user.id, session_id = session.id, "User logged in");
    Ok(AuthResponse {
        access_token,
        session_token,
        token_type: "Bearer",
        expires_in: jwt.access_token_expiry_mins * 60,
        active_role: user.role,
        roles,
        user: UserResponse::from(&user),
    })
}

/// End the caller's session, or every session when the credential carries
/// none. Returns the number of sessions revoked.
pub async fn logout(uow: &mut UnitOfWork, ctx: &AuthContext) -> AppResult<u64> {
    let revoked = match ctx.session_id {
        Some(session_id) => u64::from(uow.tx.revoke_session(session_id).await?),
        None => uow.tx.revoke_all_sessions(ctx.user_id).await?,
    };
    tracing::info!(user_id = ctx.user_id, revoked, "User logged out");
    Ok(revoked)
}

pub async fn me(
    uow: &mut UnitOfWork,
    resolver: &RoleResolver,
    ctx: &AuthContext,
) -> AppResult<MeResponse> {
    let user = find_user(uow, ctx.user_id).await?;
    let roles = resolver
        .assigned_roles(uow.tx.as_mut(), user.id, user.role)
        .await?;
    let professional_id = uow
        .tx
        .find_professional_by_user(user.id)
        .await?
        .map(|p| p.id);
    let institution_id = uow
        .tx
        .find_institution_by_user(user.id)
        .await?
        .map(|i| i.id);

    Ok(MeResponse {
        user: UserResponse::from(&user),
        active_role: RoleResolver::active_role(ctx).ok(),
        roles,
        professional_id,
        institution_id,
    })
}

/// Switch the caller's active role and issue a token claiming it.
///
/// The profile backing the target market role is created when missing.
pub async fn switch_role(
    uow: &mut UnitOfWork,
    state: &AppState,
    ctx: &AuthContext,
    target: RoleName,
    meta: &ClientMeta,
) -> AppResult<SwitchRoleResponse> {
    let switch = state
        .resolver
        .switch_active_role(uow.tx.as_mut(), ctx, target, meta)
        .await?;
    let user = find_user(uow, ctx.user_id).await?;

    match target {
        RoleName::Professional => {
            if uow.tx.find_professional_by_user(user.id).await?.is_none() {
                uow.tx.create_professional(user.id, &user.username).await?;
            }
        }
        RoleName::Institution => {
            if uow.tx.find_institution_by_user(user.id).await?.is_none() {
                uow.tx.create_institution(user.id, &user.username).await?;
            }
        }
        RoleName::Admin => {}
    }

    let access_token = generate_access_token(
        user.id,
        user.role,
        Some(switch.to),
        ctx.session_id,
        &state.config.jwt,
    )
    .map_err(token_error)?;

    Ok(SwitchRoleResponse {
        access_token,
        token_type: "Bearer",
        previous_role: switch.from,
        active_role: switch.to,
    })
}

/// Grant `role` to a user. Assignments are never removed.
pub async fn assign_role(uow: &mut UnitOfWork, user_id: DbId, role: RoleName) -> AppResult<RoleAssignment> {
    find_user(uow, user_id).await?;
    let created = uow.tx.assign_role(user_id, role).await?;
    tracing::info!(user_id, role = %role, created, "Role assigned");
    Ok(RoleAssignment {
        user_id,
        role,
        created,
    })
}
