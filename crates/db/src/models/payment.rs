//! Payment model and DTOs.

use qgig_core::payments::PaymentStatus;
use qgig_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub job_id: DbId,
    pub institution_id: DbId,
    pub professional_id: DbId,
    pub amount: f64,
    pub currency: String,
    pub merchant_reference: String,
    pub order_tracking_id: Option<String>,
    pub redirect_url: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a pending payment.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub job_id: DbId,
    pub institution_id: DbId,
    pub professional_id: DbId,
    pub amount: f64,
    pub currency: String,
    pub merchant_reference: String,
}

/// Terminal outcome applied to a pending payment.
#[derive(Debug, Clone)]
pub struct PaymentSettlement {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub failure_reason: Option<String>,
    pub completed_at: Option<Timestamp>,
}
