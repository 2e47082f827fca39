//! Handlers for the `/jobs` resource.
//!
//! Listing and detail are public. Mutations require the active role of the
//! acting party: `institution` for the owner, `professional` for applicants.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use qgig_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use qgig_core::types::DbId;
use qgig_db::models::interest::Interest;
use qgig_db::models::job::{CreateJob, Job, JobFilter, UpdateJob};
use serde::Deserialize;

use crate::engine::lifecycle::{
    self, InterestCheck, InterestedProfessional, JobWithInterests, ProfessionalJobs,
};
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireInstitution, RequireProfessional};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Case-insensitive substring match on the location.
    pub location: Option<String>,
    /// Only urgent postings when `true`.
    pub urgent: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl JobListQuery {
    fn filter(&self) -> JobFilter {
        JobFilter {
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            urgent_only: self.urgent.unwrap_or(false),
            limit: clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: clamp_offset(self.offset),
        }
    }
}

// ---------------------------------------------------------------------------
// Postings
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// Open, unexpired postings; urgent first, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let jobs = lifecycle::list_open_jobs(&mut uow, &params.filter()).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(jobs)))
}

/// POST /api/v1/jobs
pub async fn create_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Json(input): Json<CreateJob>,
) -> AppResult<(StatusCode, Json<DataResponse<Job>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::create_job(&mut uow, actor.user_id(), input).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(job))))
}

/// GET /api/v1/jobs/mine
pub async fn my_jobs(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<JobWithInterests>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let jobs = lifecycle::my_jobs(&mut uow, actor.user_id()).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(jobs)))
}

/// GET /api/v1/jobs/assigned
pub async fn assigned_jobs(
    RequireProfessional(actor): RequireProfessional,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ProfessionalJobs>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let jobs = lifecycle::assigned_jobs(&mut uow, actor.user_id()).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(jobs)))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::get_job(&mut uow, job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

/// PUT /api/v1/jobs/{id}
pub async fn update_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(input): Json<UpdateJob>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::update_job(&mut uow, actor.user_id(), job_id, &input).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

/// DELETE /api/v1/jobs/{id}
///
/// Returns 204. Previously interested professionals are notified.
pub async fn delete_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = UnitOfWork::begin(&state).await?;
    lifecycle::delete_gig(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Market status
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/close
pub async fn close_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::close_gig(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

/// POST /api/v1/jobs/{id}/cancel
pub async fn cancel_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::cancel_gig(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

/// POST /api/v1/jobs/{id}/complete
pub async fn complete_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::complete_gig(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

/// POST /api/v1/jobs/{id}/assign/{professional_id}
pub async fn assign_job(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path((job_id, professional_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Job>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let job = lifecycle::assign_gig(&mut uow, actor.user_id(), job_id, professional_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(job)))
}

// ---------------------------------------------------------------------------
// Interests
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/express-interest
pub async fn express_interest(
    RequireProfessional(actor): RequireProfessional,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Interest>>)> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let interest = lifecycle::express_interest(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(interest))))
}

/// POST /api/v1/jobs/{id}/cancel-interest
pub async fn cancel_interest(
    RequireProfessional(actor): RequireProfessional,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = UnitOfWork::begin(&state).await?;
    lifecycle::withdraw_interest(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/{id}/interests
pub async fn list_interests(
    RequireInstitution(actor): RequireInstitution,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<InterestedProfessional>>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let interests = lifecycle::interested_professionals(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(interests)))
}

/// GET /api/v1/jobs/{id}/check-interest
pub async fn check_interest(
    RequireProfessional(actor): RequireProfessional,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<DataResponse<InterestCheck>>> {
    let mut uow = UnitOfWork::begin(&state).await?;
    let check = lifecycle::check_interest(&mut uow, actor.user_id(), job_id).await?;
    uow.commit(state.transport()).await?;
    Ok(Json(DataResponse::new(check)))
}
