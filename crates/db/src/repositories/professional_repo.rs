//! Repository for the `professionals` table.

use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::profile::Professional;

const COLUMNS: &str = "id, user_id, full_name, phone_number, skills, bio, hourly_rate, \
                        location, created_at, updated_at";

pub struct ProfessionalRepo;

impl ProfessionalRepo {
    /// Create an empty profile for a user.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: DbId,
        full_name: &str,
    ) -> Result<Professional, sqlx::Error> {
        let query = format!(
            "INSERT INTO professionals (user_id, full_name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Professional>(&query)
            .bind(user_id)
            .bind(full_name)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Professional>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM professionals WHERE id = $1");
        sqlx::query_as::<_, Professional>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Option<Professional>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM professionals WHERE user_id = $1");
        sqlx::query_as::<_, Professional>(&query)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }
}
