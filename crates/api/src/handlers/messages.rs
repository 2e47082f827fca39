//! Handlers for the `/messages` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use qgig_core::types::DbId;
use qgig_db::models::message::Message;
use serde_json::json;

use crate::engine::messages::{self, SendMessage};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/messages
pub async fn send(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(input): Json<SendMessage>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let message = messages::send(&mut uow, auth.user_id, &input).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(message))))
}

/// GET /api/v1/messages/conversations/{user_id}
pub async fn conversation(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(other_user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let thread = messages::conversation(&mut uow, auth.user_id, other_user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(thread)))
}

/// GET /api/v1/messages/unread-count
pub async fn unread_count(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let count = messages::unread_count(&mut uow, auth.user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(json!({ "data": { "unread_count": count } })))
}

/// POST /api/v1/messages/{id}/read
pub async fn mark_read(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = UnitOfWork::begin(&state).await?;
    messages::mark_read(&mut uow, auth.user_id, message_id).await?;
    uow.commit(state.transport()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/messages/{id}
///
/// Hides the message from the caller's side only.
pub async fn delete(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = UnitOfWork::begin(&state).await?;
    messages::delete(&mut uow, auth.user_id, message_id).await?;
    uow.commit(state.transport()).await?;
    Ok(StatusCode::NO_CONTENT)
}
