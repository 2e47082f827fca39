//! Unit of work: one store transaction plus the pushes it will release.

use std::time::Duration;

use qgig_core::error::{CoreError, StateConflict};
use qgig_db::{Store, StoreError, StoreTx};
use qgig_events::{ChannelTransport, Outbox};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub struct UnitOfWork {
    pub tx: Box<dyn StoreTx>,
    pub outbox: Outbox,
}

impl UnitOfWork {
    /// Begin a transaction on the application store.
    pub async fn begin(state: &AppState) -> AppResult<Self> {
        Self::begin_with(state.store.as_ref(), state.config.store_timeout).await
    }

    /// Begin a transaction, giving up after `timeout`.
    pub async fn begin_with(store: &dyn Store, timeout: Duration) -> AppResult<Self> {
        let tx = tokio::time::timeout(timeout, store.begin())
            .await
            .map_err(|_| CoreError::Timeout("store transaction"))??;
        Ok(Self {
            tx,
            outbox: Outbox::new(),
        })
    }

    /// Commit, then publish everything queued on the outbox.
    ///
    /// Push failures are logged by the outbox and never reach the caller.
    pub async fn commit(self, transport: &dyn ChannelTransport) -> AppResult<()> {
        self.tx.commit().await?;
        self.outbox.flush(transport).await;
        Ok(())
    }
}

/// Translate a unique violation of `constraint` into `conflict`; any other
/// store error passes through.
pub fn conflict_on(
    constraint: &'static str,
    conflict: StateConflict,
) -> impl FnOnce(StoreError) -> AppError {
    move |err| {
        if err.is_unique_violation(constraint) {
            conflict.into()
        } else {
            err.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use qgig_db::MemoryStore;

    use super::*;

    #[test]
    fn conflict_on_translates_only_the_named_constraint() {
        let translate = conflict_on("uq_x", StateConflict::DuplicateRating);
        assert_matches!(
            translate(StoreError::UniqueViolation {
                constraint: "uq_x".to_string()
            }),
            AppError::Core(CoreError::Conflict(StateConflict::DuplicateRating))
        );

        let translate = conflict_on("uq_x", StateConflict::DuplicateRating);
        assert_matches!(
            translate(StoreError::UniqueViolation {
                constraint: "uq_y".to_string()
            }),
            AppError::Store(StoreError::UniqueViolation { .. })
        );
    }

    #[tokio::test]
    async fn begin_times_out_while_another_transaction_is_open() {
        let store = MemoryStore::new();
        let _held = store.begin().await.unwrap();

        let result = UnitOfWork::begin_with(&store, Duration::from_millis(20)).await;
        assert_matches!(
            result.err(),
            Some(AppError::Core(CoreError::Timeout("store transaction")))
        );
    }
}
