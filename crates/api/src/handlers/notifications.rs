//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthContext`]; notifications
//! belong to the user, whatever role they are acting as.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use qgig_core::types::DbId;
use qgig_db::models::notification::Notification;
use serde::Deserialize;
use serde_json::json;

use super::interests::RespondRequest;
use crate::engine::lifecycle::{self, DecisionOutcome};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::middleware::rbac::RequireInstitution;
use crate::notifications::dispatcher;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /notifications/delete-selected`.
#[derive(Debug, Deserialize)]
pub struct DeleteSelectedRequest {
    pub notification_ids: Vec<DbId>,
}

/// GET /api/v1/notifications
///
/// Newest first. `limit` defaults to 50, capped at 100.
pub async fn list_notifications(
    auth: AuthContext,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .clamped();
    let mut uow = UnitOfWork::begin(&state).await?;
    let notifications = dispatcher::list(
        &mut uow,
        auth.user_id,
        params.unread_only.unwrap_or(false),
        limit,
        offset,
    )
    .await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(notifications)))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let count = dispatcher::unread_count(&mut uow, auth.user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(json!({ "data": { "unread_count": count } })))
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let notification = dispatcher::mark_read(&mut uow, auth.user_id, notification_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(notification)))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let updated = dispatcher::mark_all_read(&mut uow, auth.user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(json!({ "data": { "updated": updated } })))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = UnitOfWork::begin(&state).await?;
    dispatcher::delete(&mut uow, auth.user_id, notification_id).await?;
    uow.commit(state.transport()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/notifications
pub async fn delete_all(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let deleted = dispatcher::delete_all(&mut uow, auth.user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(json!({ "data": { "deleted": deleted } })))
}

/// POST /api/v1/notifications/delete-selected
pub async fn delete_selected(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(input): Json<DeleteSelectedRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let deleted =
        dispatcher::delete_selected(&mut uow, auth.user_id, &input.notification_ids).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(json!({ "data": { "deleted": deleted } })))
}

/// POST /api/v1/notifications/{id}/respond
///
/// Accept or decline the interest linked to an interest notification.
pub async fn respond(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<DecisionOutcome>>> {
    let decision = input.decision()?;
    let mut uow = UnitOfWork::begin(&state).await?;
    let outcome =
        lifecycle::respond_via_notification(&mut uow, actor.user_id(), notification_id, decision)
            .await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(outcome)))
}
