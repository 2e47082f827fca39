//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use qgig_api::error::AppError;
use qgig_core::error::{AccessDenied, CoreError, StateConflict};
use qgig_core::roles::RoleName;
use qgig_db::StoreError;
use qgig_payments::GatewayError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: NotFound maps to 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Job with id 42 not found");
}

#[tokio::test]
async fn not_found_by_key_names_the_key() {
    let err = AppError::Core(CoreError::NotFoundByKey {
        entity: "Payment",
        key: "TRK-9".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Payment 'TRK-9' not found");
}

// ---------------------------------------------------------------------------
// Test: validation and bad requests map to 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("title is required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "title is required");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("OrderTrackingId is required".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: state conflicts carry their own code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn state_conflict_returns_409_with_specific_code() {
    let (status, json) = error_to_response(StateConflict::DuplicateInterest.into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "DUPLICATE_INTEREST");
    assert_eq!(json["error"], "You have already expressed interest in this gig");

    let (status, json) = error_to_response(StateConflict::InterestNotPending.into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INTEREST_NOT_PENDING");
}

// ---------------------------------------------------------------------------
// Test: auth failures split into 401 and 403
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn access_denied_returns_403_with_reason() {
    let (status, json) = error_to_response(AccessDenied::NoActiveRole.into()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "NO_ACTIVE_ROLE");

    let (status, json) =
        error_to_response(AccessDenied::RoleNotAssigned(RoleName::Admin).into()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "ROLE_NOT_ASSIGNED");
    assert_eq!(json["error"], "Role 'admin' is not assigned to this user");

    let (_, json) = error_to_response(AccessDenied::NotOwner("Job").into()).await;
    assert_eq!(json["code"], "NOT_OWNER");
}

// ---------------------------------------------------------------------------
// Test: store errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unique_violation_returns_409() {
    let err = AppError::Store(StoreError::UniqueViolation {
        constraint: "uq_users_email".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Store(StoreError::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: upstream failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_rejection_returns_502() {
    let err = AppError::Gateway(GatewayError::Rejected("invalid amount".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "EXTERNAL_SERVICE_ERROR");
}

#[tokio::test]
async fn core_timeout_returns_504() {
    let err = AppError::Core(CoreError::Timeout("payment gateway"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "TIMEOUT");
    assert_eq!(json["error"], "Timed out waiting for payment gateway");
}

// ---------------------------------------------------------------------------
// Test: internal errors are sanitized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
