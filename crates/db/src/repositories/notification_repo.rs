//! Repository for the `notifications` table.

use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::notification::{CreateNotification, Notification};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, title, message, is_read, read_at, interest_id, created_at, updated_at";

/// Provides CRUD operations for persisted notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, title, message, interest_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.interest_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List a user's notifications, newest first.
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR is_read = false)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    pub async fn count_unread(conn: &mut PgConnection, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    /// Mark one notification read. Returns `true` if the row exists.
    ///
    /// An already-read notification keeps its original `read_at`.
    pub async fn mark_read(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = true, read_at = COALESCE(read_at, NOW())
             WHERE id = $1",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification for a user read. Returns the count.
    pub async fn mark_all_read(conn: &mut PgConnection, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true, read_at = NOW()
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user's notifications, limited to `ids` when given.
    pub async fn delete_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
        ids: Option<&[DbId]>,
    ) -> Result<u64, sqlx::Error> {
        let result = match ids {
            Some(ids) => {
                sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND id = ANY($2)")
                    .bind(user_id)
                    .bind(ids)
                    .execute(conn)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM notifications WHERE user_id = $1")
                    .bind(user_id)
                    .execute(conn)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }
}
