use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qgig_core::error::CoreError;
use qgig_db::StoreError;
use qgig_payments::GatewayError;
use serde_json::json;

/// Application-level error type for HTTP handlers and engines.
///
/// Wraps [`CoreError`] for domain errors, [`StoreError`] for persistence
/// failures the engines did not translate, and [`GatewayError`] for the
/// payment provider. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `qgig_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A persistence error from the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The payment gateway failed.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler and engine return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<qgig_core::error::StateConflict> for AppError {
    fn from(conflict: qgig_core::error::StateConflict) -> Self {
        AppError::Core(conflict.into())
    }
}

impl From<qgig_core::error::AccessDenied> for AppError {
    fn from(denied: qgig_core::error::AccessDenied) -> Self {
        AppError::Core(denied.into())
    }
}

impl AppError {
    /// HTTP status, machine-readable code and client-facing message.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Store errors ---
            AppError::Store(err) => classify_store_error(err),

            // --- Gateway errors ---
            AppError::Gateway(err) => {
                tracing::error!(error = %err, "Payment gateway error");
                if err.is_timeout() {
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        "TIMEOUT",
                        "Payment provider timed out".to_string(),
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        "EXTERNAL_SERVICE_ERROR",
                        format!("Payment provider error: {err}"),
                    )
                }
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::NotFoundByKey { entity, key } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{key}' not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(conflict) => {
            (StatusCode::CONFLICT, conflict.code(), conflict.to_string())
        }
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(denied) => (StatusCode::FORBIDDEN, denied.code(), denied.to_string()),
        CoreError::ExternalService(msg) => {
            tracing::error!(error = %msg, "External service error");
            (
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_SERVICE_ERROR",
                msg.clone(),
            )
        }
        CoreError::Timeout(what) => {
            tracing::error!(operation = what, "Operation timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                format!("Timed out waiting for {what}"),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a store error the engine did not translate itself.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on `uq_*` constraints map to 409.
/// - Foreign-key violations map to 409 (the write references or strands
///   another row).
/// - Everything else maps to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        StoreError::UniqueViolation { constraint } if constraint.starts_with("uq_") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        StoreError::ForeignKeyViolation { constraint } => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Operation violates foreign key: {constraint}"),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
