//! Repository for the `institutions` table.

use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::profile::Institution;

const COLUMNS: &str = "id, user_id, institution_name, description, contact_email, \
                        contact_phone, location, created_at, updated_at";

pub struct InstitutionRepo;

impl InstitutionRepo {
    /// Create an empty profile for a user.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: DbId,
        institution_name: &str,
    ) -> Result<Institution, sqlx::Error> {
        let query = format!(
            "INSERT INTO institutions (user_id, institution_name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Institution>(&query)
            .bind(user_id)
            .bind(institution_name)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Institution>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM institutions WHERE id = $1");
        sqlx::query_as::<_, Institution>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Option<Institution>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM institutions WHERE user_id = $1");
        sqlx::query_as::<_, Institution>(&query)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }
}
