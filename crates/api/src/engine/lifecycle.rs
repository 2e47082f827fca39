//! Job lifecycle engine.
//!
//! Owns the job/interest state machine. Every mutation runs inside the
//! caller's [`UnitOfWork`] together with the notification rows it produces;
//! real-time pushes are queued on the outbox and leave only after commit.
//!
//! Ownership checks resolve the caller's institution profile and compare it
//! with `job.institution_id`; a mismatch is `NotOwner("Job")`.

use std::collections::HashMap;

use qgig_core::channels::{
    ChannelKey, EVENT_GIG_UPDATE, EVENT_INTEREST_DECISION, EVENT_JOB_INTEREST_SENT,
    EVENT_NEW_MESSAGE,
};
use qgig_core::error::{AccessDenied, CoreError, StateConflict};
use qgig_core::jobs::validate_posting;
use qgig_core::lifecycle::{Decision, InterestStatus, JobStatus};
use qgig_core::notifications;
use qgig_core::types::{DbId, Timestamp};
use qgig_db::models::interest::Interest;
use qgig_db::models::job::{CreateJob, Job, JobFilter, UpdateJob};
use qgig_db::models::message::CreateMessage;
use qgig_db::models::profile::{Institution, Professional};
use qgig_db::store::constraints;
use serde::Serialize;
use serde_json::json;

use super::uow::{conflict_on, UnitOfWork};
use super::{institution_for, lock_job, professional_for};
use crate::error::{AppError, AppResult};
use crate::notifications::dispatcher::{self, notify};

/// Outcome of an institution's decision on an interest.
#[derive(Debug, Serialize)]
pub struct DecisionOutcome {
    pub interest: Interest,
    pub job: Job,
}

/// An institution's job with its interest counters.
#[derive(Debug, Serialize)]
pub struct JobWithInterests {
    #[serde(flatten)]
    pub job: Job,
    pub interest_count: usize,
    pub pending_interest_count: usize,
}

/// A professional's view of their work.
#[derive(Debug, Serialize)]
pub struct ProfessionalJobs {
    pub assigned: Vec<Job>,
    pub pending_interests: Vec<Interest>,
}

#[derive(Debug, Serialize)]
pub struct InterestedProfessional {
    pub interest: Interest,
    pub professional: Professional,
}

#[derive(Debug, Serialize)]
pub struct InterestCheck {
    pub has_interest: bool,
    pub interest_id: Option<DbId>,
    pub expressed_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock a job and verify it belongs to the caller's institution.
async fn owned_job(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
) -> AppResult<(Job, Institution)> {
    let institution = institution_for(uow.tx.as_mut(), user_id).await?;
    let job = lock_job(uow.tx.as_mut(), job_id).await?;
    if job.institution_id != institution.id {
        return Err(AccessDenied::NotOwner("Job").into());
    }
    Ok((job, institution))
}

async fn find_interest(uow: &mut UnitOfWork, interest_id: DbId) -> AppResult<Interest> {
    Ok(uow
        .tx
        .find_interest(interest_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Interest",
            id: interest_id,
        })?)
}

fn display_name<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    let name = name.trim();
    if name.is_empty() {
        fallback
    } else {
        name
    }
}

fn push_gig_update(uow: &mut UnitOfWork, job: &Job) {
    uow.outbox.push(
        ChannelKey::Institution(job.institution_id),
        EVENT_GIG_UPDATE,
        json!({
            "job_id": job.id,
            "title": job.title,
            "status": job.status,
            "assigned_professional_id": job.assigned_professional_id,
        }),
    );
}

async fn notify_professional(
    uow: &mut UnitOfWork,
    professional_id: DbId,
    text: notifications::NotificationText,
    interest_id: Option<DbId>,
) -> AppResult<()> {
    match uow.tx.find_professional(professional_id).await? {
        Some(professional) => {
            notify(uow, professional.user_id, text, interest_id).await?;
        }
        None => {
            tracing::warn!(professional_id, "Professional profile missing, notification skipped");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Postings
// ---------------------------------------------------------------------------

/// Post a new gig for the caller's institution. Starts OPEN.
pub async fn create_job(uow: &mut UnitOfWork, user_id: DbId, mut input: CreateJob) -> AppResult<Job> {
    let institution = institution_for(uow.tx.as_mut(), user_id).await?;
    validate_posting(
        &input.title,
        &input.description,
        &input.location,
        input.pay_amount,
        input.duration_hours,
    )
    .map_err(CoreError::Validation)?;

    input.institution_id = institution.id;
    let job = uow.tx.create_job(&input).await?;
    tracing::info!(job_id = job.id, institution_id = institution.id, "Job created");
    Ok(job)
}

/// Edit an OPEN posting owned by the caller.
pub async fn update_job(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
    input: &UpdateJob,
) -> AppResult<Job> {
    let (job, _) = owned_job(uow, user_id, job_id).await?;
    if job.status != JobStatus::Open {
        return Err(StateConflict::JobNotOpen.into());
    }
    validate_posting(
        input.title.as_deref().unwrap_or(&job.title),
        input.description.as_deref().unwrap_or(&job.description),
        input.location.as_deref().unwrap_or(&job.location),
        input.pay_amount.unwrap_or(job.pay_amount),
        input.duration_hours.or(job.duration_hours),
    )
    .map_err(CoreError::Validation)?;

    Ok(uow.tx.update_job_details(job_id, input).await?)
}

// ---------------------------------------------------------------------------
// Interests
// ---------------------------------------------------------------------------

/// A professional asks for an OPEN gig.
///
/// The `(job_id, professional_id)` unique index backs the duplicate check, so
/// two concurrent calls for the same pair cannot both succeed.
pub async fn express_interest(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
) -> AppResult<Interest> {
    let professional = professional_for(uow.tx.as_mut(), user_id).await?;
    let job = lock_job(uow.tx.as_mut(), job_id).await?;
    if job.status != JobStatus::Open {
        return Err(StateConflict::JobNotOpen.into());
    }
    if uow
        .tx
        .find_interest_for(job_id, professional.id)
        .await?
        .is_some()
    {
        return Err(StateConflict::DuplicateInterest.into());
    }

    let interest = uow
        .tx
        .create_interest(job_id, professional.id)
        .await
        .map_err(conflict_on(
            constraints::INTERESTS_JOB_PROFESSIONAL,
            StateConflict::DuplicateInterest,
        ))?;

    let institution = uow
        .tx
        .find_institution(job.institution_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Institution",
            id: job.institution_id,
        })?;
    let name = display_name(&professional.full_name, "A professional");
    notify(
        uow,
        institution.user_id,
        notifications::interest_expressed(name, &job.title),
        Some(interest.id),
    )
    .await?;

    uow.outbox.push(
        ChannelKey::Institution(institution.id),
        EVENT_JOB_INTEREST_SENT,
        json!({
            "interest_id": interest.id,
            "job_id": job.id,
            "job_title": job.title,
            "professional_id": professional.id,
            "professional_name": name,
        }),
    );

    tracing::info!(
        interest_id = interest.id,
        job_id,
        professional_id = professional.id,
        "Interest expressed",
    );
    Ok(interest)
}

/// A professional withdraws their interest.
///
/// Withdrawing as the assignee of an ASSIGNED gig reopens it.
pub async fn withdraw_interest(uow: &mut UnitOfWork, user_id: DbId, job_id: DbId) -> AppResult<()> {
    let professional = professional_for(uow.tx.as_mut(), user_id).await?;
    let job = lock_job(uow.tx.as_mut(), job_id).await?;
    let interest = uow
        .tx
        .find_interest_for(job_id, professional.id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Interest for job",
            id: job_id,
        })?;

    if job.assigned_professional_id == Some(professional.id) {
        let next = job.status.transition(JobStatus::Open)?;
        let reopened = uow.tx.set_job_status(job_id, next, None).await?;
        push_gig_update(uow, &reopened);
        let restored = restore_declined_applicants(uow, &reopened, &interest).await?;
        tracing::info!(
            job_id,
            professional_id = professional.id,
            restored,
            "Assignee withdrew, job reopened",
        );
    }

    uow.tx.delete_interest(interest.id).await?;

    if let Some(institution) = uow.tx.find_institution(job.institution_id).await? {
        let name = display_name(&professional.full_name, "A professional");
        notify(
            uow,
            institution.user_id,
            notifications::interest_withdrawn(name, &job.title),
            None,
        )
        .await?;
    }

    tracing::info!(interest_id = interest.id, job_id, "Interest withdrawn");
    Ok(())
}

/// The owning institution accepts or declines a pending interest.
///
/// Accepting assigns the gig, declines every other pending interest on it and
/// sends the accepted professional a welcome message.
pub async fn respond_to_interest(
    uow: &mut UnitOfWork,
    user_id: DbId,
    interest_id: DbId,
    decision: Decision,
) -> AppResult<DecisionOutcome> {
    let job_id = find_interest(uow, interest_id).await?.job_id;
    let (job, institution) = owned_job(uow, user_id, job_id).await?;

    // Re-read under the job lock; a concurrent decision may have landed.
    let interest = find_interest(uow, interest_id).await?;
    if interest.status != InterestStatus::Pending {
        return Err(StateConflict::InterestNotPending.into());
    }

    let job = match decision {
        Decision::Accept => {
            if job.status != JobStatus::Open {
                return Err(StateConflict::JobNotOpen.into());
            }
            let next = job.status.transition(JobStatus::Assigned)?;
            uow.tx
                .set_job_status(job.id, next, Some(interest.professional_id))
                .await?
        }
        Decision::Decline => job,
    };
    let interest = uow
        .tx
        .set_interest_status(interest.id, decision.resulting_status())
        .await?;

    let professional = uow
        .tx
        .find_professional(interest.professional_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Professional",
            id: interest.professional_id,
        })?;
    let institution_name = display_name(&institution.institution_name, "The institution");

    notify(
        uow,
        professional.user_id,
        notifications::interest_decided(decision, &job.title, institution_name),
        Some(interest.id),
    )
    .await?;

    if decision == Decision::Accept {
        decline_remaining(uow, &job, interest.id).await?;
        send_welcome(uow, &job, &institution, &professional).await?;
    }

    uow.outbox.push(
        ChannelKey::Professional(professional.id),
        EVENT_INTEREST_DECISION,
        json!({
            "interest_id": interest.id,
            "job_id": job.id,
            "job_title": job.title,
            "decision": decision,
            "status": interest.status,
        }),
    );

    tracing::info!(interest_id, job_id = job.id, ?decision, "Interest decided");
    Ok(DecisionOutcome { interest, job })
}

/// Decline every other pending interest on a freshly filled gig.
async fn decline_remaining(uow: &mut UnitOfWork, job: &Job, accepted_id: DbId) -> AppResult<()> {
    let others: Vec<Interest> = uow
        .tx
        .list_interests_for_job(job.id)
        .await?
        .into_iter()
        .filter(|i| i.id != accepted_id && i.status == InterestStatus::Pending)
        .collect();

    for other in others {
        uow.tx
            .set_interest_status(other.id, InterestStatus::Declined)
            .await?;
        notify_professional(
            uow,
            other.professional_id,
            notifications::position_filled(&job.title),
            Some(other.id),
        )
        .await?;
    }
    Ok(())
}

/// Put applicants declined by the fill of `accepted` back to pending.
///
/// Those declines share the acceptance's transaction, so their `updated_at`
/// is never earlier than the accepted interest's. Earlier manual declines
/// stay declined.
async fn restore_declined_applicants(
    uow: &mut UnitOfWork,
    job: &Job,
    accepted: &Interest,
) -> AppResult<usize> {
    if accepted.status != InterestStatus::Accepted {
        return Ok(0);
    }
    let declined: Vec<Interest> = uow
        .tx
        .list_interests_for_job(job.id)
        .await?
        .into_iter()
        .filter(|i| {
            i.id != accepted.id
                && i.status == InterestStatus::Declined
                && i.updated_at >= accepted.updated_at
        })
        .collect();

    for other in &declined {
        uow.tx
            .set_interest_status(other.id, InterestStatus::Pending)
            .await?;
        notify_professional(
            uow,
            other.professional_id,
            notifications::gig_reopened(&job.title),
            Some(other.id),
        )
        .await?;
    }
    Ok(declined.len())
}

async fn send_welcome(
    uow: &mut UnitOfWork,
    job: &Job,
    institution: &Institution,
    professional: &Professional,
) -> AppResult<()> {
    let name = display_name(&institution.institution_name, "The institution");
    let (subject, content) = notifications::welcome_message(&job.title, name);
    let message = uow
        .tx
        .create_message(&CreateMessage {
            sender_id: institution.user_id,
            receiver_id: professional.user_id,
            job_id: Some(job.id),
            subject: Some(subject),
            content,
        })
        .await?;
    uow.outbox.push(
        ChannelKey::User(professional.user_id),
        EVENT_NEW_MESSAGE,
        json!(message),
    );
    Ok(())
}

/// Resolve the interest linked to one of the caller's notifications and
/// decide on it. The notification is marked read.
pub async fn respond_via_notification(
    uow: &mut UnitOfWork,
    user_id: DbId,
    notification_id: DbId,
    decision: Decision,
) -> AppResult<DecisionOutcome> {
    let notification = dispatcher::find_owned(uow, user_id, notification_id).await?;
    let interest_id = notification.interest_id.ok_or_else(|| {
        CoreError::Validation("Notification is not linked to an interest".into())
    })?;
    let outcome = respond_to_interest(uow, user_id, interest_id, decision).await?;
    dispatcher::mark_read(uow, user_id, notification_id).await?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Market status changes
// ---------------------------------------------------------------------------

/// Withdraw a gig from the market. Broadcast on the institution channel only.
pub async fn close_gig(uow: &mut UnitOfWork, user_id: DbId, job_id: DbId) -> AppResult<Job> {
    let (job, _) = owned_job(uow, user_id, job_id).await?;
    if job.status == JobStatus::Closed {
        return Err(StateConflict::AlreadyClosed.into());
    }
    let next = job.status.transition(JobStatus::Closed)?;
    let job = uow.tx.set_job_status(job_id, next, None).await?;
    push_gig_update(uow, &job);
    tracing::info!(job_id, "Job closed");
    Ok(job)
}

/// Cancel a gig; the assigned professional, if any, is told.
pub async fn cancel_gig(uow: &mut UnitOfWork, user_id: DbId, job_id: DbId) -> AppResult<Job> {
    let (job, institution) = owned_job(uow, user_id, job_id).await?;
    let next = job.status.transition(JobStatus::Cancelled)?;
    let previous_assignee = job.assigned_professional_id;
    let job = uow.tx.set_job_status(job_id, next, None).await?;

    if let Some(professional_id) = previous_assignee {
        let name = display_name(&institution.institution_name, "The institution");
        notify_professional(
            uow,
            professional_id,
            notifications::gig_cancelled(&job.title, name),
            None,
        )
        .await?;
    }
    push_gig_update(uow, &job);
    tracing::info!(job_id, "Job cancelled");
    Ok(job)
}

/// Mark an ASSIGNED gig done.
pub async fn complete_gig(uow: &mut UnitOfWork, user_id: DbId, job_id: DbId) -> AppResult<Job> {
    let (job, _) = owned_job(uow, user_id, job_id).await?;
    let next = job.status.transition(JobStatus::Completed)?;
    let professional_id = job
        .assigned_professional_id
        .ok_or(StateConflict::NoProfessionalAssigned)?;
    let job = uow
        .tx
        .set_job_status(job_id, next, Some(professional_id))
        .await?;

    notify_professional(
        uow,
        professional_id,
        notifications::gig_completed(&job.title),
        None,
    )
    .await?;
    push_gig_update(uow, &job);
    tracing::info!(job_id, "Job completed");
    Ok(job)
}

/// Delete a gig and its interests, then tell every professional who had
/// shown interest.
///
/// Affected professionals are captured before the delete cascades.
pub async fn delete_gig(uow: &mut UnitOfWork, user_id: DbId, job_id: DbId) -> AppResult<()> {
    let (job, _) = owned_job(uow, user_id, job_id).await?;
    if !matches!(job.status, JobStatus::Open | JobStatus::Assigned) {
        return Err(StateConflict::JobNotDeletable(job.status).into());
    }
    if !uow.tx.list_payments_for_job(job_id).await?.is_empty() {
        return Err(StateConflict::JobHasPayments.into());
    }

    let mut recipients = Vec::new();
    for interest in uow.tx.list_interests_for_job(job_id).await? {
        if let Some(professional) = uow.tx.find_professional(interest.professional_id).await? {
            recipients.push(professional.user_id);
        }
    }
    // A direct assignee may hold no interest row.
    if let Some(assignee_id) = job.assigned_professional_id {
        if let Some(assignee) = uow.tx.find_professional(assignee_id).await? {
            recipients.push(assignee.user_id);
        }
    }
    recipients.sort_unstable();
    recipients.dedup();

    uow.tx.delete_job(job_id).await.map_err(|err| {
        if err.is_foreign_key_violation(constraints::PAYMENTS_JOB_FK) {
            StateConflict::JobHasPayments.into()
        } else {
            AppError::from(err)
        }
    })?;

    for recipient in &recipients {
        notify(uow, *recipient, notifications::gig_removed(&job.title), None).await?;
    }
    uow.outbox.push(
        ChannelKey::Institution(job.institution_id),
        EVENT_GIG_UPDATE,
        json!({ "job_id": job.id, "title": job.title, "status": "deleted" }),
    );

    tracing::info!(job_id, notified = recipients.len(), "Job deleted");
    Ok(())
}

/// Assign a professional directly, bypassing the interest flow.
pub async fn assign_gig(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
    professional_id: DbId,
) -> AppResult<Job> {
    let (job, institution) = owned_job(uow, user_id, job_id).await?;
    if job.status != JobStatus::Open {
        return Err(StateConflict::JobNotOpen.into());
    }
    let professional = uow
        .tx
        .find_professional(professional_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Professional",
            id: professional_id,
        })?;

    let next = job.status.transition(JobStatus::Assigned)?;
    let job = uow
        .tx
        .set_job_status(job_id, next, Some(professional.id))
        .await?;

    if let Some(interest) = uow.tx.find_interest_for(job_id, professional.id).await? {
        if interest.status == InterestStatus::Pending {
            uow.tx
                .set_interest_status(interest.id, InterestStatus::Accepted)
                .await?;
        }
    }

    let name = display_name(&institution.institution_name, "The institution");
    notify(
        uow,
        professional.user_id,
        notifications::gig_assigned(&job.title, name),
        None,
    )
    .await?;
    push_gig_update(uow, &job);
    tracing::info!(job_id, professional_id, "Job assigned directly");
    Ok(job)
}

/// Close every OPEN gig whose expiry date has passed.
pub async fn expire_jobs(uow: &mut UnitOfWork, now: Timestamp) -> AppResult<Vec<Job>> {
    let mut expired = Vec::new();
    for job in uow.tx.list_expired_open_jobs(now).await? {
        let next = job.status.transition(JobStatus::Closed)?;
        let job = uow.tx.set_job_status(job.id, next, None).await?;
        push_gig_update(uow, &job);
        expired.push(job);
    }
    Ok(expired)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub async fn list_open_jobs(uow: &mut UnitOfWork, filter: &JobFilter) -> AppResult<Vec<Job>> {
    Ok(uow.tx.list_open_jobs(filter).await?)
}

pub async fn get_job(uow: &mut UnitOfWork, job_id: DbId) -> AppResult<Job> {
    uow.tx.find_job(job_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }
        .into()
    })
}

/// The caller's institution postings with interest counters.
pub async fn my_jobs(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<Vec<JobWithInterests>> {
    let institution = institution_for(uow.tx.as_mut(), user_id).await?;
    let jobs = uow.tx.list_jobs_for_institution(institution.id).await?;

    let mut out = Vec::with_capacity(jobs.len());
    for job in jobs {
        let interests = uow.tx.list_interests_for_job(job.id).await?;
        let pending = interests
            .iter()
            .filter(|i| i.status == InterestStatus::Pending)
            .count();
        out.push(JobWithInterests {
            interest_count: interests.len(),
            pending_interest_count: pending,
            job,
        });
    }
    Ok(out)
}

/// Gigs assigned to the caller plus their still-pending interests.
pub async fn assigned_jobs(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<ProfessionalJobs> {
    let professional = professional_for(uow.tx.as_mut(), user_id).await?;
    let assigned = uow.tx.list_jobs_assigned_to(professional.id).await?;
    let pending_interests = uow
        .tx
        .list_interests_for_professional(professional.id)
        .await?
        .into_iter()
        .filter(|i| i.status == InterestStatus::Pending)
        .collect();
    Ok(ProfessionalJobs {
        assigned,
        pending_interests,
    })
}

/// Everyone who expressed interest in one of the caller's gigs.
pub async fn interested_professionals(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
) -> AppResult<Vec<InterestedProfessional>> {
    let institution = institution_for(uow.tx.as_mut(), user_id).await?;
    let job = get_job(uow, job_id).await?;
    if job.institution_id != institution.id {
        return Err(AccessDenied::NotOwner("Job").into());
    }

    let interests = uow.tx.list_interests_for_job(job_id).await?;
    let mut profiles: HashMap<DbId, Professional> = HashMap::new();
    for interest in &interests {
        if let Some(p) = uow.tx.find_professional(interest.professional_id).await? {
            profiles.insert(p.id, p);
        }
    }
    Ok(interests
        .into_iter()
        .filter_map(|interest| {
            profiles
                .remove(&interest.professional_id)
                .map(|professional| InterestedProfessional {
                    interest,
                    professional,
                })
        })
        .collect())
}

/// Whether the caller currently has an interest on `job_id`.
pub async fn check_interest(
    uow: &mut UnitOfWork,
    user_id: DbId,
    job_id: DbId,
) -> AppResult<InterestCheck> {
    let professional = professional_for(uow.tx.as_mut(), user_id).await?;
    let interest = uow.tx.find_interest_for(job_id, professional.id).await?;
    Ok(InterestCheck {
        has_interest: interest.is_some(),
        interest_id: interest.as_ref().map(|i| i.id),
        expressed_at: interest.map(|i| i.created_at),
    })
}
