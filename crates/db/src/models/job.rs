//! Job posting model and DTOs.

use qgig_core::lifecycle::JobStatus;
use qgig_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub institution_id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub pay_amount: f64,
    pub duration_hours: Option<f64>,
    pub is_urgent: bool,
    pub job_type: Option<String>,
    pub sector: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub assigned_professional_id: Option<DbId>,
    pub start_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a job. Status always starts as `open`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJob {
    #[serde(skip)]
    pub institution_id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub pay_amount: f64,
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub is_urgent: bool,
    pub job_type: Option<String>,
    pub sector: Option<String>,
    pub start_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
}

/// DTO for editing an open job. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJob {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub pay_amount: Option<f64>,
    pub duration_hours: Option<f64>,
    pub is_urgent: Option<bool>,
    pub job_type: Option<String>,
    pub sector: Option<String>,
    pub start_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
}

/// Filters for the public open-job listing.
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Case-insensitive substring match on location.
    pub location: Option<String>,
    pub urgent_only: bool,
    pub limit: i64,
    pub offset: i64,
}
