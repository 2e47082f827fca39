//! Handlers for the `/payments` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use qgig_core::types::DbId;
use qgig_db::models::payment::Payment;
use serde::Deserialize;
use serde_json::json;

use crate::engine::payments::{self, InitiatedPayment};
use crate::engine::uow::UnitOfWork;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::middleware::rbac::{RequireInstitution, RequireMarketRole};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /payments/initiate`.
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    #[serde(alias = "gig_id")]
    pub job_id: DbId,
}

/// Gateway callback body.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "OrderTrackingId", alias = "order_tracking_id")]
    pub order_tracking_id: Option<String>,
    #[serde(rename = "OrderNotificationType", default)]
    pub notification_type: Option<String>,
    #[serde(rename = "OrderMerchantReference", default)]
    pub merchant_reference: Option<String>,
}

/// POST /api/v1/payments/initiate
///
/// Returns 201 with the gateway redirect URL. A gateway failure marks the
/// payment FAILED before the error is returned.
pub async fn initiate(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Json(input): Json<InitiatePaymentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<InitiatedPayment>>)> {
    let initiated = payments::initiate(&state, actor.user_id(), input.job_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(initiated))))
}

/// POST /api/v1/payments/webhook
///
/// Unauthenticated gateway callback. The status is re-fetched from the
/// gateway, never trusted from the body.
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let tracking_id = payload
        .order_tracking_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing OrderTrackingId".into()))?;

    tracing::info!(
        order_tracking_id = %tracking_id,
        notification_type = ?payload.notification_type,
        merchant_reference = ?payload.merchant_reference,
        "Payment webhook received",
    );
    let payment = payments::webhook(&state, &tracking_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Webhook processed",
        "orderTrackingId": tracking_id,
        "paymentStatus": payment.status,
    })))
}

/// POST /api/v1/payments/{id}/sync
pub async fn sync(
    RequireMarketRole(actor): RequireMarketRole,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Payment>>> {
    let payment = payments::sync(&state, actor.user_id(), payment_id).await?;
    Ok(Json(DataResponse::new(payment)))
}

/// GET /api/v1/payments/mine
///
/// Payments of the caller's active-role profile.
pub async fn my_payments(
    RequireMarketRole(actor): RequireMarketRole,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let list = payments::my_payments(&mut uow, actor.user_id(), actor.role).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(list)))
}

/// GET /api/v1/payments/{id}
pub async fn get_payment(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Payment>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let payment = payments::visible_payment(&mut uow, auth.user_id, payment_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(payment)))
}
