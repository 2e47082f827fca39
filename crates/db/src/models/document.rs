//! Verification document metadata model.

use qgig_core::documents::{DocumentStatus, DocumentType};
use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: DocumentStatus,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub admin_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub user_id: DbId,
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}
