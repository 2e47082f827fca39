//! Periodic closing of OPEN gigs whose expiry date has passed.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::engine::lifecycle;
use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;
use crate::state::AppState;

/// Run one sweep and return how many gigs were closed.
pub async fn sweep(state: &AppState) -> AppResult<usize> {
    let mut uow = UnitOfWork::begin(state).await?;
    let expired = lifecycle::expire_jobs(&mut uow, Utc::now()).await?;
    uow.commit(state.transport()).await?;

    for job in &expired {
        tracing::info!(job_id = job.id, institution_id = job.institution_id, "Gig expired");
    }
    Ok(expired.len())
}

/// Run the expiry sweep every `interval` until `cancel` is triggered.
pub async fn run(state: AppState, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Job expiry sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job expiry sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep(&state).await {
                    Ok(0) => tracing::debug!("Job expiry sweep: nothing to close"),
                    Ok(closed) => tracing::info!(closed, "Job expiry sweep: closed gigs"),
                    Err(e) => tracing::error!(error = %e, "Job expiry sweep failed"),
                }
            }
        }
    }
}
