//! Ratings between the two parties of a completed gig.

use qgig_core::error::{AccessDenied, CoreError, StateConflict};
use qgig_core::lifecycle::JobStatus;
use qgig_core::notifications;
use qgig_core::ratings::{average, validate_feedback, validate_score};
use qgig_core::types::DbId;
use qgig_db::models::rating::{CreateRating, Rating};
use qgig_db::store::constraints;
use serde::{Deserialize, Serialize};

use super::uow::{conflict_on, UnitOfWork};
use crate::error::AppResult;
use crate::notifications::dispatcher::notify;

/// Request body for `POST /ratings`.
#[derive(Debug, Deserialize)]
pub struct SubmitRating {
    pub job_id: DbId,
    pub score: i16,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserRatings {
    pub user_id: DbId,
    pub average: Option<f64>,
    pub total: usize,
    pub ratings: Vec<Rating>,
}

/// Rate the other party of a COMPLETED gig. One rating per rater and gig.
pub async fn submit(uow: &mut UnitOfWork, user_id: DbId, input: &SubmitRating) -> AppResult<Rating> {
    validate_score(input.score).map_err(CoreError::Validation)?;
    validate_feedback(input.feedback.as_deref()).map_err(CoreError::Validation)?;

    let job = uow.tx.find_job(input.job_id).await?.ok_or(CoreError::NotFound {
        entity: "Job",
        id: input.job_id,
    })?;
    if job.status != JobStatus::Completed {
        return Err(CoreError::Validation("Only completed gigs can be rated".into()).into());
    }

    let institution = uow
        .tx
        .find_institution(job.institution_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Institution",
            id: job.institution_id,
        })?;
    let professional = match job.assigned_professional_id {
        Some(id) => uow.tx.find_professional(id).await?,
        None => None,
    }
    .ok_or(StateConflict::NoProfessionalAssigned)?;

    let rated_user_id = if user_id == institution.user_id {
        professional.user_id
    } else if user_id == professional.user_id {
        institution.user_id
    } else {
        return Err(AccessDenied::NotOwner("Job").into());
    };

    if uow
        .tx
        .find_rating_by_rater(job.id, user_id)
        .await?
        .is_some()
    {
        return Err(StateConflict::DuplicateRating.into());
    }

    let rating = uow
        .tx
        .create_rating(&CreateRating {
            job_id: job.id,
            rater_user_id: user_id,
            rated_user_id,
            score: input.score,
            feedback: input
                .feedback
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        })
        .await
        .map_err(conflict_on(constraints::RATINGS_JOB_RATER, StateConflict::DuplicateRating))?;

    notify(
        uow,
        rated_user_id,
        notifications::rating_received(rating.score, &job.title),
        None,
    )
    .await?;

    tracing::info!(rating_id = rating.id, job_id = job.id, "Rating submitted");
    Ok(rating)
}

pub async fn user_ratings(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<UserRatings> {
    if uow.tx.find_user(user_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }
    let ratings = uow.tx.list_ratings_for_user(user_id).await?;
    let scores: Vec<i16> = ratings.iter().map(|r| r.score).collect();
    Ok(UserRatings {
        user_id,
        average: average(&scores),
        total: ratings.len(),
        ratings,
    })
}
