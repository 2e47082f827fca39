//! Repository for the `messages` table.

use qgig_core::messages::{STATUS_READ, STATUS_SENT};
use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::message::{CreateMessage, Message};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, sender_id, receiver_id, job_id, subject, content, status, is_read, \
                        read_at, deleted_by_sender, deleted_by_receiver, created_at, updated_at";

/// Provides CRUD operations for direct messages.
pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateMessage,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (sender_id, receiver_id, job_id, subject, content, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.sender_id)
            .bind(input.receiver_id)
            .bind(input.job_id)
            .bind(&input.subject)
            .bind(&input.content)
            .bind(STATUS_SENT)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Both directions between two users, oldest first, minus the ones
    /// `user_id` deleted on their side.
    pub async fn list_conversation(
        conn: &mut PgConnection,
        user_id: DbId,
        other_user_id: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2 AND deleted_by_sender = false)
                OR (sender_id = $2 AND receiver_id = $1 AND deleted_by_receiver = false)
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(user_id)
            .bind(other_user_id)
            .fetch_all(conn)
            .await
    }

    pub async fn count_unread(conn: &mut PgConnection, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE receiver_id = $1 AND is_read = false AND deleted_by_receiver = false",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    pub async fn mark_read(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages
             SET is_read = true, status = $2, read_at = COALESCE(read_at, NOW())
             WHERE id = $1",
        )
        .bind(id)
        .bind(STATUS_READ)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete for one side of the conversation.
    pub async fn hide(
        conn: &mut PgConnection,
        id: DbId,
        for_sender: bool,
    ) -> Result<bool, sqlx::Error> {
        let sql = if for_sender {
            "UPDATE messages SET deleted_by_sender = true WHERE id = $1"
        } else {
            "UPDATE messages SET deleted_by_receiver = true WHERE id = $1"
        };
        let result = sqlx::query(sql).bind(id).execute(conn).await?;
        Ok(result.rows_affected() > 0)
    }
}
