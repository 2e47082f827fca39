//! Repository for the `jobs` table.

use qgig_core::lifecycle::JobStatus;
use qgig_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::job::{CreateJob, Job, JobFilter, UpdateJob};

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, institution_id, title, description, location, pay_amount, \
    duration_hours, is_urgent, job_type, sector, status, assigned_professional_id, \
    start_date, expiry_date, created_at, updated_at";

/// Provides CRUD operations for job postings.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new open job.
    pub async fn create(conn: &mut PgConnection, input: &CreateJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs \
                (institution_id, title, description, location, pay_amount, duration_hours, \
                 is_urgent, job_type, sector, start_date, expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.institution_id)
            .bind(input.title.trim())
            .bind(input.description.trim())
            .bind(input.location.trim())
            .bind(input.pay_amount)
            .bind(input.duration_hours)
            .bind(input.is_urgent)
            .bind(&input.job_type)
            .bind(&input.sector)
            .bind(input.start_date)
            .bind(input.expiry_date)
            .fetch_one(conn)
            .await
    }

    /// Find a job by its internal ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a job and lock its row until the enclosing transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Update descriptive fields. Only non-`None` fields are applied.
    pub async fn update_details(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateJob,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                location = COALESCE($4, location), \
                pay_amount = COALESCE($5, pay_amount), \
                duration_hours = COALESCE($6, duration_hours), \
                is_urgent = COALESCE($7, is_urgent), \
                job_type = COALESCE($8, job_type), \
                sector = COALESCE($9, sector), \
                start_date = COALESCE($10, start_date), \
                expiry_date = COALESCE($11, expiry_date) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.location.as_deref().map(str::trim))
            .bind(input.pay_amount)
            .bind(input.duration_hours)
            .bind(input.is_urgent)
            .bind(&input.job_type)
            .bind(&input.sector)
            .bind(input.start_date)
            .bind(input.expiry_date)
            .fetch_one(conn)
            .await
    }

    /// Set status and assignee together so the assignee CHECK holds.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: JobStatus,
        assigned_professional_id: Option<DbId>,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = $2, assigned_professional_id = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(assigned_professional_id)
            .fetch_one(conn)
            .await
    }

    /// Delete a job. Interests cascade. Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Public listing of open, unexpired jobs. Urgent jobs first, newest first.
    pub async fn list_open(
        conn: &mut PgConnection,
        filter: &JobFilter,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status = 'open' \
               AND (expiry_date IS NULL OR expiry_date > NOW()) \
               AND ($1::text IS NULL OR location ILIKE '%' || $1 || '%') \
               AND (NOT $2 OR is_urgent) \
             ORDER BY is_urgent DESC, created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(&filter.location)
            .bind(filter.urgent_only)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(conn)
            .await
    }

    /// All jobs posted by an institution, newest first.
    pub async fn list_for_institution(
        conn: &mut PgConnection,
        institution_id: DbId,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs WHERE institution_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(institution_id)
            .fetch_all(conn)
            .await
    }

    /// Jobs assigned to (or completed by) a professional.
    pub async fn list_assigned_to(
        conn: &mut PgConnection,
        professional_id: DbId,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE assigned_professional_id = $1 \
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(professional_id)
            .fetch_all(conn)
            .await
    }

    /// Open jobs past their expiry date, locked for update.
    ///
    /// `SKIP LOCKED` lets the sweep pass over jobs a request is mutating.
    pub async fn list_expired_open(
        conn: &mut PgConnection,
        now: Timestamp,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status = 'open' AND expiry_date IS NOT NULL AND expiry_date <= $1 \
             ORDER BY id \
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(now)
            .fetch_all(conn)
            .await
    }
}
