//! Repository for the `documents` table.

use qgig_core::documents::DocumentStatus;
use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::document::{CreateDocument, Document};

const COLUMNS: &str = "id, user_id, document_type, file_path, file_name, file_size, mime_type, \
                        status, reviewed_by, reviewed_at, admin_notes, created_at, updated_at";

/// Provides CRUD operations for verification documents.
pub struct DocumentRepo;

impl DocumentRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateDocument,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (user_id, document_type, file_path, file_name, file_size, mime_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(input.user_id)
            .bind(input.document_type.as_str())
            .bind(&input.file_path)
            .bind(&input.file_name)
            .bind(input.file_size)
            .bind(&input.mime_type)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    /// Review queue, oldest first.
    pub async fn list_pending(conn: &mut PgConnection) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE status = 'pending' ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Document>(&query).fetch_all(conn).await
    }

    pub async fn review(
        conn: &mut PgConnection,
        id: DbId,
        status: DocumentStatus,
        reviewer_id: DbId,
        notes: Option<&str>,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "UPDATE documents
             SET status = $2, reviewed_by = $3, reviewed_at = NOW(), admin_notes = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(reviewer_id)
            .bind(notes)
            .fetch_one(conn)
            .await
    }
}
