//! Authentication extractor.
//!
//! Both credential forms produce the same [`AuthContext`], so nothing
//! downstream branches on how the caller authenticated.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use qgig_core::error::{AccessDenied, CoreError};
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;

use crate::auth::jwt::{hash_session_token, validate_token};
use crate::engine::uow::UnitOfWork;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "qgig_session";

/// A credential presented by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Signed access token.
    Bearer(String),
    /// Opaque server-side session token.
    Session(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Bearer,
    Session,
}

/// The authenticated caller.
///
/// ```ignore
/// async fn my_handler(auth: AuthContext) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: DbId,
    pub email: String,
    /// The user's legacy single-role column.
    pub legacy_role: Option<RoleName>,
    /// Raw active-role claim from a bearer credential.
    pub claimed_role: Option<String>,
    /// Server-side session backing this request, if any.
    pub session_id: Option<DbId>,
    /// Active role recorded on that session.
    pub session_role: Option<RoleName>,
    pub credential: CredentialKind,
}

/// Find a credential in the request headers.
///
/// The `Authorization` header takes precedence over the session cookie.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<Credential> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        return Some(match value.strip_prefix("Bearer ") {
            Some(token) => Credential::Bearer(token.trim().to_string()),
            // Malformed header: reported by `authenticate`.
            None => Credential::Bearer(String::new()),
        });
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| Credential::Session(value.to_string()))
}

/// Resolve a credential into an [`AuthContext`].
///
/// Loads the user row for either credential form; inactive users are
/// denied. A bearer token naming a session is rejected once that session is
/// revoked or expired.
pub async fn authenticate(state: &AppState, credential: Credential) -> AppResult<AuthContext> {
    let mut uow = UnitOfWork::begin(state).await?;

    let (user_id, claimed_role, session, kind) = match credential {
        Credential::Bearer(token) => {
            if token.is_empty() {
                return Err(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                )
                .into());
            }
            let claims = validate_token(&token, &state.config.jwt).map_err(|_| {
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            })?;
            let session = match claims.sid {
                Some(sid) => Some(uow.tx.find_session(sid).await?.ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized("Session has ended".into()))
                })?),
                None => None,
            };
            (claims.sub, claims.active_role, session, CredentialKind::Bearer)
        }
        Credential::Session(token) => {
            let session = uow
                .tx
                .find_session_by_token_hash(&hash_session_token(&token))
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized("Invalid or expired session".into()))
                })?;
            (session.user_id, None, Some(session), CredentialKind::Session)
        }
    };

    let user = uow.tx.find_user(user_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("User no longer exists".into()))
    })?;
    if session.as_ref().is_some_and(|s| s.user_id != user.id) {
        return Err(CoreError::Unauthorized("Session does not match token".into()).into());
    }
    if !user.is_active {
        return Err(AccessDenied::AccountDisabled.into());
    }

    Ok(AuthContext {
        user_id: user.id,
        email: user.email,
        legacy_role: Some(user.role),
        claimed_role,
        session_id: session.as_ref().map(|s| s.id),
        session_role: session.as_ref().and_then(|s| s.active_role()),
        credential: kind,
    })
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = credential_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header or session cookie".into(),
            ))
        })?;
        authenticate(state, credential).await
    }
}

/// Caller metadata recorded in audit entries.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self {
            ip_address,
            user_agent,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
