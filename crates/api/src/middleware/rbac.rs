//! Role-based access control extractors.
//!
//! Each extractor authenticates the caller, resolves the active role, and
//! verifies it against both the route's required roles and the user's
//! persisted assignments. Rejections are 403 with the specific
//! [`AccessDenied`](qgig_core::error::AccessDenied) kind.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;

use super::auth::AuthContext;
use crate::engine::uow::UnitOfWork;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated caller acting as a verified role.
#[derive(Debug, Clone)]
pub struct Actor {
    pub auth: AuthContext,
    pub role: RoleName,
}

impl Actor {
    pub fn user_id(&self) -> DbId {
        self.auth.user_id
    }
}

async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    required: &[RoleName],
) -> Result<Actor, AppError> {
    let auth = AuthContext::from_request_parts(parts, state).await?;
    let mut uow = UnitOfWork::begin(state).await?;
    let role = state
        .resolver
        .authorize(uow.tx.as_mut(), &auth, required)
        .await?;
    Ok(Actor { auth, role })
}

/// Requires the active role `professional`.
///
/// ```ignore
/// async fn express(RequireProfessional(actor): RequireProfessional) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireProfessional(pub Actor);

impl FromRequestParts<AppState> for RequireProfessional {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[RoleName::Professional])
            .await
            .map(Self)
    }
}

/// Requires the active role `institution`.
pub struct RequireInstitution(pub Actor);

impl FromRequestParts<AppState> for RequireInstitution {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[RoleName::Institution])
            .await
            .map(Self)
    }
}

/// Requires the active role `admin`.
pub struct RequireAdmin(pub Actor);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &[RoleName::Admin]).await.map(Self)
    }
}

/// Requires either market role. Handlers branch on `actor.role`.
pub struct RequireMarketRole(pub Actor);

impl FromRequestParts<AppState> for RequireMarketRole {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, &RoleName::MARKET_ROLES)
            .await
            .map(Self)
    }
}
