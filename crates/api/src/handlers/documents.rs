//! Handlers for the `/documents` resource.
//!
//! Upload itself happens elsewhere; these endpoints record and list the
//! metadata. Review lives under `/admin/documents`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use qgig_db::models::document::Document;

use crate::engine::documents::{self, RegisterDocument};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/documents
pub async fn register(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(input): Json<RegisterDocument>,
) -> AppResult<(StatusCode, Json<DataResponse<Document>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let document = documents::register(&mut uow, auth.user_id, &input).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(document))))
}

/// GET /api/v1/documents/mine
pub async fn my_documents(
    auth: AuthContext,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let list = documents::my_documents(&mut uow, auth.user_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(list)))
}
