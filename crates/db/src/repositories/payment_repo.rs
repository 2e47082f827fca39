//! Repository for the `payments` table.

use qgig_core::types::DbId;
use sqlx::PgConnection;

use crate::models::payment::{CreatePayment, Payment, PaymentSettlement};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, job_id, institution_id, professional_id, amount, currency, \
                        merchant_reference, order_tracking_id, redirect_url, transaction_id, \
                        payment_method, status, failure_reason, completed_at, created_at, updated_at";

/// Provides CRUD operations for payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Insert a pending payment.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreatePayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments
                (job_id, institution_id, professional_id, amount, currency, merchant_reference)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(input.job_id)
            .bind(input.institution_id)
            .bind(input.professional_id)
            .bind(input.amount)
            .bind(&input.currency)
            .bind(&input.merchant_reference)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a payment and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a payment by gateway tracking id and lock its row.
    pub async fn find_by_tracking_id_for_update(
        conn: &mut PgConnection,
        tracking_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM payments WHERE order_tracking_id = $1 FOR UPDATE");
        sqlx::query_as::<_, Payment>(&query)
            .bind(tracking_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_for_job(
        conn: &mut PgConnection,
        job_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM payments WHERE job_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Payment>(&query)
            .bind(job_id)
            .fetch_all(conn)
            .await
    }

    pub async fn list_for_institution(
        conn: &mut PgConnection,
        institution_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE institution_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(institution_id)
            .fetch_all(conn)
            .await
    }

    pub async fn list_for_professional(
        conn: &mut PgConnection,
        professional_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE professional_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(professional_id)
            .fetch_all(conn)
            .await
    }

    /// Record the gateway order after submission.
    pub async fn set_order(
        conn: &mut PgConnection,
        id: DbId,
        tracking_id: &str,
        redirect_url: Option<&str>,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET order_tracking_id = $2, redirect_url = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(tracking_id)
            .bind(redirect_url)
            .fetch_one(conn)
            .await
    }

    /// Apply a terminal status.
    ///
    /// A second completed payment for the same job violates
    /// `uq_payments_one_completed_per_job`.
    pub async fn settle(
        conn: &mut PgConnection,
        id: DbId,
        settlement: &PaymentSettlement,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET
                status = $2,
                transaction_id = COALESCE($3, transaction_id),
                payment_method = COALESCE($4, payment_method),
                failure_reason = $5,
                completed_at = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(settlement.status.as_str())
            .bind(&settlement.transaction_id)
            .bind(&settlement.payment_method)
            .bind(&settlement.failure_reason)
            .bind(settlement.completed_at)
            .fetch_one(conn)
            .await
    }
}
