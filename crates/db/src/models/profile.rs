//! Professional and institution profile models.

use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `professionals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Professional {
    pub id: DbId,
    pub user_id: DbId,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
    pub location: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `institutions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Institution {
    pub id: DbId,
    pub user_id: DbId,
    pub institution_name: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
