//! Payment orchestrator.
//!
//! Initiation spans two transactions around the gateway call so no row lock
//! is held while the provider answers:
//!
//! 1. validate the gig and insert a PENDING payment (commit),
//! 2. submit the order to the gateway, bounded by `GATEWAY_TIMEOUT_SECS`,
//! 3. record the tracking id, or settle the payment FAILED and surface the
//!    gateway error.
//!
//! Steps 2 and 3 run on a spawned task so a dropped request cannot leave
//! the payment PENDING without a tracking id.
//!
//! Reconciliation is idempotent: replaying a status already recorded is a
//! no-op, and a report that contradicts a terminal status is logged and
//! ignored.

use std::future::Future;

use chrono::Utc;
use qgig_core::channels::{ChannelKey, EVENT_PAYMENT_UPDATE};
use qgig_core::error::{AccessDenied, CoreError, StateConflict};
use qgig_core::lifecycle::JobStatus;
use qgig_core::notifications;
use qgig_core::payments::{
    generate_merchant_reference, split_payer_name, PaymentStatus, DEFAULT_PAYER_PHONE,
    ORDER_DESCRIPTION,
};
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;
use qgig_db::models::payment::{CreatePayment, Payment, PaymentSettlement};
use qgig_db::store::constraints;
use qgig_payments::{GatewayError, OrderRequest, TransactionStatus};
use serde::Serialize;
use serde_json::json;

use super::uow::{conflict_on, UnitOfWork};
use super::{institution_for, lock_job};
use crate::error::{AppError, AppResult};
use crate::notifications::dispatcher::notify;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InitiatedPayment {
    pub payment: Payment,
    pub redirect_url: Option<String>,
    pub order_tracking_id: String,
}

/// Run a gateway call under the configured deadline.
async fn gateway_call<T, F>(state: &AppState, call: F) -> AppResult<T>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(state.config.gateway_timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CoreError::Timeout("payment gateway").into()),
    }
}

fn push_payment_update(uow: &mut UnitOfWork, payment: &Payment) {
    let payload = json!({
        "payment_id": payment.id,
        "job_id": payment.job_id,
        "status": payment.status,
        "amount": payment.amount,
        "currency": payment.currency,
    });
    uow.outbox.push(
        ChannelKey::Institution(payment.institution_id),
        EVENT_PAYMENT_UPDATE,
        payload.clone(),
    );
    uow.outbox.push(
        ChannelKey::Professional(payment.professional_id),
        EVENT_PAYMENT_UPDATE,
        payload,
    );
}

// ---------------------------------------------------------------------------
// Initiation
// ---------------------------------------------------------------------------

/// Start paying the professional assigned to one of the caller's gigs.
///
/// Submission runs on its own task. A caller that goes away mid-call does
/// not cancel it, so the payment still gets its tracking id or is settled
/// FAILED.
pub async fn initiate(state: &AppState, user_id: DbId, job_id: DbId) -> AppResult<InitiatedPayment> {
    let (payment, order) = {
        let mut uow = UnitOfWork::begin(state).await?;
        let prepared = prepare(&mut uow, state, user_id, job_id).await?;
        uow.commit(state.transport()).await?;
        prepared
    };

    let task_state = state.clone();
    tokio::spawn(async move { submit(&task_state, payment, order).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Payment submission task failed: {e}")))?
}

/// Submit the order and record the outcome on the PENDING payment.
async fn submit(state: &AppState, payment: Payment, order: OrderRequest) -> AppResult<InitiatedPayment> {
    let submitted = gateway_call(state, state.gateway.submit_order(&order))
        .await
        .and_then(|response| {
            let tracking_id = response
                .order_tracking_id
                .filter(|id| !id.trim().is_empty())
                .ok_or(GatewayError::MissingField("order_tracking_id"))?;
            Ok((tracking_id, response.redirect_url))
        });

    let (tracking_id, redirect_url) = match submitted {
        Ok(order) => order,
        Err(err) => {
            mark_failed(state, payment.id, &err).await;
            return Err(err);
        }
    };

    let mut uow = UnitOfWork::begin(state).await?;
    let payment = uow
        .tx
        .set_payment_order(payment.id, &tracking_id, redirect_url.as_deref())
        .await?;
    uow.commit(state.transport()).await?;

    tracing::info!(
        payment_id = payment.id,
        job_id = payment.job_id,
        order_tracking_id = %tracking_id,
        "Payment initiated",
    );
    Ok(InitiatedPayment {
        payment,
        redirect_url,
        order_tracking_id: tracking_id,
    })
}

/// Validate the gig and insert the PENDING payment.
async fn prepare(
    uow: &mut UnitOfWork,
    state: &AppState,
    user_id: DbId,
    job_id: DbId,
) -> AppResult<(Payment, OrderRequest)> {
    let institution = institution_for(uow.tx.as_mut(), user_id).await?;
    let job = lock_job(uow.tx.as_mut(), job_id).await?;
    if job.institution_id != institution.id {
        return Err(AccessDenied::NotOwner("Job").into());
    }
    if !job.status.is_payable() {
        return Err(StateConflict::JobNotPayable(job.status).into());
    }
    let professional_id = job
        .assigned_professional_id
        .ok_or(StateConflict::NoProfessionalAssigned)?;
    if uow
        .tx
        .list_payments_for_job(job_id)
        .await?
        .iter()
        .any(|p| p.status == PaymentStatus::Completed)
    {
        return Err(StateConflict::DuplicatePayment.into());
    }

    let payer = uow.tx.find_user(user_id).await?.ok_or(CoreError::NotFound {
        entity: "User",
        id: user_id,
    })?;

    let payment = uow
        .tx
        .create_payment(&CreatePayment {
            job_id,
            institution_id: institution.id,
            professional_id,
            amount: job.pay_amount,
            currency: state.gateway.currency().to_string(),
            merchant_reference: generate_merchant_reference(),
        })
        .await?;

    let (first_name, last_name) = split_payer_name(&institution.institution_name);
    let order = OrderRequest {
        merchant_reference: payment.merchant_reference.clone(),
        amount: payment.amount,
        description: ORDER_DESCRIPTION.to_string(),
        payer_email: payer.email,
        payer_phone: institution
            .contact_phone
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYER_PHONE.to_string()),
        payer_first_name: first_name,
        payer_last_name: last_name,
    };
    Ok((payment, order))
}

/// Settle a payment FAILED after the gateway refused or timed out.
///
/// Errors here are logged; the caller still sees the gateway error.
async fn mark_failed(state: &AppState, payment_id: DbId, cause: &AppError) {
    let result: AppResult<()> = async {
        let mut uow = UnitOfWork::begin(state).await?;
        if let Some(payment) = uow.tx.lock_payment(payment_id).await? {
            if payment.status == PaymentStatus::Pending {
                let payment = uow
                    .tx
                    .settle_payment(
                        payment_id,
                        &PaymentSettlement {
                            status: PaymentStatus::Failed,
                            transaction_id: None,
                            payment_method: None,
                            failure_reason: Some(cause.to_string()),
                            completed_at: None,
                        },
                    )
                    .await?;
                push_payment_update(&mut uow, &payment);
            }
        }
        uow.commit(state.transport()).await
    }
    .await;

    match result {
        Ok(()) => tracing::warn!(payment_id, error = %cause, "Payment initiation failed"),
        Err(e) => tracing::error!(
            payment_id,
            error = %e,
            cause = %cause,
            "Could not mark payment as failed",
        ),
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Apply a gateway status report to the payment with `tracking_id`.
///
/// Completion also completes an ASSIGNED gig and notifies the professional.
pub async fn reconcile(
    uow: &mut UnitOfWork,
    tracking_id: &str,
    report: &TransactionStatus,
) -> AppResult<Payment> {
    let payment = uow
        .tx
        .lock_payment_by_tracking_id(tracking_id)
        .await?
        .ok_or_else(|| CoreError::NotFoundByKey {
            entity: "Payment",
            key: tracking_id.to_string(),
        })?;

    let Some(target) = report.settled_status() else {
        tracing::debug!(
            payment_id = payment.id,
            reported = %report.payment_status_description,
            "Payment not settled yet",
        );
        return Ok(payment);
    };
    if payment.status == target {
        return Ok(payment);
    }
    if !payment.status.can_transition_to(target) {
        tracing::warn!(
            payment_id = payment.id,
            current = %payment.status,
            reported = %target,
            "Ignoring conflicting payment status",
        );
        return Ok(payment);
    }

    let completed = target == PaymentStatus::Completed;
    let settlement = PaymentSettlement {
        status: target,
        transaction_id: report.transaction_id.clone(),
        payment_method: report.payment_method.clone(),
        failure_reason: (!completed).then(|| report.payment_status_description.clone()),
        completed_at: completed.then(Utc::now),
    };
    let payment = uow
        .tx
        .settle_payment(payment.id, &settlement)
        .await
        .map_err(|err| {
            if err.is_unique_violation(constraints::PAYMENTS_ONE_COMPLETED_PER_JOB) {
                tracing::warn!(payment_id = payment.id, "Job already has a completed payment");
            }
            conflict_on(
                constraints::PAYMENTS_ONE_COMPLETED_PER_JOB,
                StateConflict::DuplicatePayment,
            )(err)
        })?;

    if completed {
        complete_job(uow, &payment).await?;
    }
    push_payment_update(uow, &payment);

    tracing::info!(payment_id = payment.id, status = %payment.status, "Payment reconciled");
    Ok(payment)
}

async fn complete_job(uow: &mut UnitOfWork, payment: &Payment) -> AppResult<()> {
    let job = lock_job(uow.tx.as_mut(), payment.job_id).await?;
    match job.status {
        JobStatus::Assigned => {
            let next = job.status.transition(JobStatus::Completed)?;
            uow.tx
                .set_job_status(job.id, next, job.assigned_professional_id)
                .await?;
        }
        JobStatus::Completed => {}
        other => {
            tracing::warn!(job_id = job.id, status = %other, "Paid job left in its current status");
        }
    }

    if let Some(professional) = uow.tx.find_professional(payment.professional_id).await? {
        notify(
            uow,
            professional.user_id,
            notifications::payment_received(payment.amount, &payment.currency, &job.title),
            None,
        )
        .await?;
    }
    Ok(())
}

/// Handle a gateway callback: fetch the authoritative status, then reconcile.
pub async fn webhook(state: &AppState, tracking_id: &str) -> AppResult<Payment> {
    {
        let mut uow = UnitOfWork::begin(state).await?;
        let known = uow.tx.lock_payment_by_tracking_id(tracking_id).await?;
        if known.is_none() {
            return Err(CoreError::NotFoundByKey {
                entity: "Payment",
                key: tracking_id.to_string(),
            }
            .into());
        }
    }
    fetch_and_reconcile(state, tracking_id).await
}

/// Re-query the gateway for one of the caller's payments.
pub async fn sync(state: &AppState, user_id: DbId, payment_id: DbId) -> AppResult<Payment> {
    let payment = {
        let mut uow = UnitOfWork::begin(state).await?;
        visible_payment(&mut uow, user_id, payment_id).await?
    };
    let tracking_id = payment.order_tracking_id.ok_or_else(|| {
        CoreError::Validation("Payment has no gateway order to synchronise".into())
    })?;
    fetch_and_reconcile(state, &tracking_id).await
}

async fn fetch_and_reconcile(state: &AppState, tracking_id: &str) -> AppResult<Payment> {
    let report = gateway_call(state, state.gateway.get_transaction_status(tracking_id)).await?;
    let mut uow = UnitOfWork::begin(state).await?;
    let payment = reconcile(&mut uow, tracking_id, &report).await?;
    uow.commit(state.transport()).await?;
    Ok(payment)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// A payment visible to the paying institution or the paid professional.
pub async fn visible_payment(
    uow: &mut UnitOfWork,
    user_id: DbId,
    payment_id: DbId,
) -> AppResult<Payment> {
    let payment = uow
        .tx
        .find_payment(payment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Payment",
            id: payment_id,
        })?;

    let institution = uow.tx.find_institution_by_user(user_id).await?;
    let professional = uow.tx.find_professional_by_user(user_id).await?;
    let payer = institution.is_some_and(|i| i.id == payment.institution_id);
    let payee = professional.is_some_and(|p| p.id == payment.professional_id);
    if !(payer || payee) {
        return Err(AccessDenied::NotOwner("Payment").into());
    }
    Ok(payment)
}

/// Payments of the profile behind the caller's active role.
pub async fn my_payments(
    uow: &mut UnitOfWork,
    user_id: DbId,
    active_role: RoleName,
) -> AppResult<Vec<Payment>> {
    match active_role {
        RoleName::Institution => match uow.tx.find_institution_by_user(user_id).await? {
            Some(i) => Ok(uow.tx.list_payments_for_institution(i.id).await?),
            None => Ok(Vec::new()),
        },
        RoleName::Professional => match uow.tx.find_professional_by_user(user_id).await? {
            Some(p) => Ok(uow.tx.list_payments_for_professional(p.id).await?),
            None => Ok(Vec::new()),
        },
        RoleName::Admin => Ok(Vec::new()),
    }
}
