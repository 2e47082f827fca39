//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use qgig_db::models::user::UserResponse;
use serde::Deserialize;

use super::parse_role;
use crate::engine::accounts::{
    self, AuthResponse, LoginRequest, MeResponse, RegisterRequest, SwitchRoleResponse,
};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::auth::{AuthContext, ClientMeta, SESSION_COOKIE};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /auth/switch-role`.
#[derive(Debug, Deserialize)]
pub struct SwitchRoleRequest {
    pub role: String,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// POST /api/v1/auth/register
///
/// Create an account with both market roles. Returns 201.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let user = accounts::register(&mut uow, &input).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// POST /api/v1/auth/login
///
/// Returns an access token and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let response: AuthResponse = accounts::login(&mut uow, &state, &input, &meta).await?;
    uow.commit(state.transport()).await?;

    let max_age = state.config.jwt.session_expiry_days * 24 * 60 * 60;
    let cookie = session_cookie(&response.session_token, max_age);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(DataResponse::new(response)),
    ))
}

/// POST /api/v1/auth/logout
///
/// Revoke the caller's session and clear the cookie. Returns 204.
pub async fn logout(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut uow = UnitOfWork::begin(&state).await?;
    accounts::logout(&mut uow, &auth).await?;
    uow.commit(state.transport()).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie("", 0))],
    ))
}

/// GET /api/v1/auth/me
pub async fn me(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let me = accounts::me(&mut uow, &state.resolver, &auth).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(me)))
}

/// POST /api/v1/auth/switch-role
///
/// Switch the active role. The returned token carries the new role claim.
pub async fn switch_role(
    auth: AuthContext,
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(input): Json<SwitchRoleRequest>,
) -> AppResult<Json<DataResponse<SwitchRoleResponse>>> {
    let target = parse_role(&input.role)?;
    let mut uow = UnitOfWork::begin(&state).await?;
    let switched = accounts::switch_role(&mut uow, &state, &auth, target, &meta).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(switched)))
}
