//! Repository for the `interests` table.

use qgig_core::lifecycle::InterestStatus;
use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::interest::Interest;

const COLUMNS: &str = "id, job_id, professional_id, status, created_at, updated_at";

/// Provides CRUD operations for interests.
pub struct InterestRepo;

impl InterestRepo {
    /// Insert a pending interest.
    ///
    /// A second row for the same pair violates
    /// `uq_interests_job_id_professional_id`.
    pub async fn create(
        conn: &mut PgConnection,
        job_id: DbId,
        professional_id: DbId,
    ) -> Result<Interest, sqlx::Error> {
        let query = format!(
            "INSERT INTO interests (job_id, professional_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Interest>(&query)
            .bind(job_id)
            .bind(professional_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Interest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM interests WHERE id = $1");
        sqlx::query_as::<_, Interest>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_for_pair(
        conn: &mut PgConnection,
        job_id: DbId,
        professional_id: DbId,
    ) -> Result<Option<Interest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM interests WHERE job_id = $1 AND professional_id = $2");
        sqlx::query_as::<_, Interest>(&query)
            .bind(job_id)
            .bind(professional_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: InterestStatus,
    ) -> Result<Interest, sqlx::Error> {
        let query = format!("UPDATE interests SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Interest>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(conn)
            .await
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM interests WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Interests on a job, oldest first.
    pub async fn list_for_job(
        conn: &mut PgConnection,
        job_id: DbId,
    ) -> Result<Vec<Interest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM interests WHERE job_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Interest>(&query)
            .bind(job_id)
            .fetch_all(conn)
            .await
    }

    /// Interests expressed by a professional, newest first.
    pub async fn list_for_professional(
        conn: &mut PgConnection,
        professional_id: DbId,
    ) -> Result<Vec<Interest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM interests WHERE professional_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Interest>(&query)
            .bind(professional_id)
            .fetch_all(conn)
            .await
    }
}
