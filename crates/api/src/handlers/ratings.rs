//! Handlers for the `/ratings` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use qgig_core::types::DbId;
use qgig_db::models::rating::Rating;

use crate::engine::ratings::{self, SubmitRating, UserRatings};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::middleware::rbac::RequireMarketRole;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/ratings
pub async fn submit(
    RequireMarketRole(actor): RequireMarketRole,
    State(state): State<AppState>,
    Json(input): Json<SubmitRating>,
) -> AppResult<(StatusCode, Json<DataResponse<Rating>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let rating = ratings::submit(&mut uow, actor.user_id(), &input).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(rating))))
}

/// GET /api/v1/ratings/users/{id}
pub async fn user_ratings(
    _auth: AuthContext,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserRatings>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let summary = ratings::user_ratings(&mut uow, user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(summary)))
}
