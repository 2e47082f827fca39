//! Handlers for `/admin` endpoints. All require the active role `admin`.

use axum::extract::{Path, State};
use axum::Json;
use qgig_core::types::DbId;
use qgig_db::models::document::Document;
use serde::Deserialize;

use super::parse_role;
use crate::engine::accounts::{self, RoleAssignment};
use crate::engine::documents::{self, ReviewDocument};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users/{id}/roles`.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

/// POST /api/v1/admin/users/{id}/roles
///
/// Grant a role. Granting a role the user already holds is a no-op.
pub async fn assign_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<AssignRoleRequest>,
) -> AppResult<Json<DataResponse<RoleAssignment>>> {
    let role = parse_role(&input.role)?;
    let mut uow = UnitOfWork::begin(&state).await?;
    let assignment = accounts::assign_role(&mut uow, user_id, role).await?;
    uow.commit(state.transport()).await?;
    tracing::info!(admin_id = admin.user_id(), user_id, role = %role, "Admin assigned role");
    Ok(Json(DataResponse::new(assignment)))
}

/// GET /api/v1/admin/documents/pending
pub async fn pending_documents(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let pending = documents::pending_documents(&mut uow).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(pending)))
}

/// POST /api/v1/admin/documents/{id}/review
pub async fn review_document(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
    Json(input): Json<ReviewDocument>,
) -> AppResult<Json<DataResponse<Document>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let document = documents::review(&mut uow, admin.user_id(), document_id, &input).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(document)))
}
