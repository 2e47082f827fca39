//! Rating model.

use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ratings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rating {
    pub id: DbId,
    pub job_id: DbId,
    pub rater_user_id: DbId,
    pub rated_user_id: DbId,
    pub score: i16,
    pub feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateRating {
    pub job_id: DbId,
    pub rater_user_id: DbId,
    pub rated_user_id: DbId,
    pub score: i16,
    pub feedback: Option<String>,
}
