//! Transactional engines.
//!
//! Every operation runs against a [`uow::UnitOfWork`]: reads and writes go
//! through its store transaction, real-time pushes are queued on its outbox,
//! and the caller commits once. Pushes leave the process only after the
//! commit succeeded.
//!
//! - [`lifecycle`] -- job and interest state machine.
//! - [`payments`] -- payment initiation and gateway reconciliation.
//! - [`accounts`] -- registration, login, sessions, role switching.
//! - [`ratings`], [`messages`], [`documents`] -- peripheral features.

pub mod accounts;
pub mod documents;
pub mod lifecycle;
pub mod messages;
pub mod payments;
pub mod ratings;
pub mod uow;

use qgig_core::error::CoreError;
use qgig_core::types::DbId;
use qgig_db::models::job::Job;
use qgig_db::models::profile::{Institution, Professional};
use qgig_db::StoreTx;

use crate::error::AppResult;

/// The caller's institution profile.
pub async fn institution_for(tx: &mut dyn StoreTx, user_id: DbId) -> AppResult<Institution> {
    tx.find_institution_by_user(user_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Institution profile for user",
                id: user_id,
            }
            .into()
        })
}

/// The caller's professional profile.
pub async fn professional_for(tx: &mut dyn StoreTx, user_id: DbId) -> AppResult<Professional> {
    tx.find_professional_by_user(user_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Professional profile for user",
                id: user_id,
            }
            .into()
        })
}

/// Fetch a job, holding its row lock for the rest of the transaction.
pub async fn lock_job(tx: &mut dyn StoreTx, job_id: DbId) -> AppResult<Job> {
    tx.lock_job(job_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }
        .into()
    })
}
