//! Repository for the `ratings` table.

use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::rating::{CreateRating, Rating};

const COLUMNS: &str =
    "id, job_id, rater_user_id, rated_user_id, score, feedback, created_at, updated_at";

/// Provides CRUD operations for ratings.
pub struct RatingRepo;

impl RatingRepo {
    /// Insert a rating. One per (job, rater); a repeat violates
    /// `uq_ratings_job_id_rater_user_id`.
    pub async fn create(conn: &mut PgConnection, input: &CreateRating) -> Result<Rating, sqlx::Error> {
        let query = format!(
            "INSERT INTO ratings (job_id, rater_user_id, rated_user_id, score, feedback)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Rating>(&query)
            .bind(input.job_id)
            .bind(input.rater_user_id)
            .bind(input.rated_user_id)
            .bind(input.score)
            .bind(&input.feedback)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_rater(
        conn: &mut PgConnection,
        job_id: DbId,
        rater_user_id: DbId,
    ) -> Result<Option<Rating>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM ratings WHERE job_id = $1 AND rater_user_id = $2");
        sqlx::query_as::<_, Rating>(&query)
            .bind(job_id)
            .bind(rater_user_id)
            .fetch_optional(conn)
            .await
    }

    /// Ratings received by a user, newest first.
    pub async fn list_for_rated_user(
        conn: &mut PgConnection,
        rated_user_id: DbId,
    ) -> Result<Vec<Rating>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ratings WHERE rated_user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Rating>(&query)
            .bind(rated_user_id)
            .fetch_all(conn)
            .await
    }
}
