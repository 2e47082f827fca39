//! Handlers for the `/interests` resource.

use axum::extract::{Path, State};
use axum::Json;
use qgig_core::error::CoreError;
use qgig_core::lifecycle::Decision;
use qgig_core::types::DbId;
use serde::Deserialize;

use crate::engine::lifecycle::{self, DecisionOutcome};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::rbac::RequireInstitution;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for interest decisions: `{"action": "accept" | "decline"}`.
///
/// `reject` is accepted as a synonym for `decline`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: String,
}

impl RespondRequest {
    pub fn decision(&self) -> AppResult<Decision> {
        self.action
            .parse()
            .map_err(|e: String| CoreError::Validation(e).into())
    }
}

/// POST /api/v1/interests/{id}/respond
pub async fn respond(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(interest_id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<DecisionOutcome>>> {
    let decision = input.decision()?;
    let mut uow = UnitOfWork::begin(&state).await?;
    let outcome =
        lifecycle::respond_to_interest(&mut uow, actor.user_id(), interest_id, decision).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(outcome)))
}
