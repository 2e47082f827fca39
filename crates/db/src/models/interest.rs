//! Interest model: a professional's expression of intent to take a job.

use qgig_core::lifecycle::InterestStatus;
use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `interests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Interest {
    pub id: DbId,
    pub job_id: DbId,
    pub professional_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: InterestStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
