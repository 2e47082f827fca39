//! Persistence layer for QGig.
//!
//! - [`models`] -- row structs and DTOs.
//! - [`repositories`] -- zero-sized `*Repo` structs issuing SQL.
//! - [`store`] -- the transactional [`Store`] / [`StoreTx`] interface the
//!   engines are written against.
//! - [`pg`] -- PostgreSQL implementation backed by the repositories.
//! - [`memory`] -- in-process implementation with the same constraints,
//!   used by tests.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{Store, StoreError, StoreTx};

pub type DbPool = sqlx::PgPool;

/// Pool tuning applied by [`create_pool`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Server-side `statement_timeout` applied to every connection.
    pub statement_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(10),
        }
    }
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, settings: &PoolSettings) -> Result<DbPool, sqlx::Error> {
    let options: PgConnectOptions = database_url.parse()?;
    let options = options.options([(
        "statement_timeout",
        settings.statement_timeout.as_millis().to_string(),
    )]);

    tracing::debug!(
        max_connections = settings.max_connections,
        statement_timeout_ms = settings.statement_timeout.as_millis() as u64,
        "Opening connection pool"
    );
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
