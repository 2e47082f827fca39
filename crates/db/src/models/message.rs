//! Direct message model.

use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub sender_id: DbId,
    pub receiver_id: DbId,
    pub job_id: Option<DbId>,
    pub subject: Option<String>,
    pub content: String,
    pub status: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub deleted_by_sender: bool,
    #[serde(skip_serializing)]
    pub deleted_by_receiver: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub sender_id: DbId,
    pub receiver_id: DbId,
    pub job_id: Option<DbId>,
    pub subject: Option<String>,
    pub content: String,
}
