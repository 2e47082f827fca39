use std::time::Duration;

use qgig_db::PoolSettings;

use crate::auth::jwt::JwtConfig;
use crate::auth::roles::LegacyRolePolicy;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Whole-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Connection pool tuning.
    pub db: PoolSettings,
    /// Upper bound on waiting for a store transaction to begin.
    pub store_timeout: Duration,
    /// Upper bound on one payment gateway operation, retries included.
    pub gateway_timeout: Duration,
    /// Interval of the job expiry sweep.
    pub job_expiry_sweep: Duration,
    /// Implicit roles for users without any role assignment rows.
    pub legacy_role_policy: LegacyRolePolicy,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

fn env_or<T: std::str::FromStr>(name: &str, default: &str) -> T {
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>()))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `DB_MAX_CONNECTIONS`        | `20`                    |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`   | `5`                     |
    /// | `DB_STATEMENT_TIMEOUT_SECS` | `10`                    |
    /// | `STORE_TIMEOUT_SECS`        | `10`                    |
    /// | `GATEWAY_TIMEOUT_SECS`      | `20`                    |
    /// | `JOB_EXPIRY_SWEEP_SECS`     | `300`                   |
    /// | `LEGACY_ROLE_POLICY`        | `both`                  |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, and when `GATEWAY_TIMEOUT_SECS` is not
    /// below `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", "3000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let db = PoolSettings {
            max_connections: env_or("DB_MAX_CONNECTIONS", "20"),
            acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", "5")),
            statement_timeout: Duration::from_secs(env_or("DB_STATEMENT_TIMEOUT_SECS", "10")),
        };

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "30"),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", "30"),
            db,
            store_timeout: Duration::from_secs(env_or("STORE_TIMEOUT_SECS", "10")),
            gateway_timeout: Duration::from_secs(env_or("GATEWAY_TIMEOUT_SECS", "20")),
            job_expiry_sweep: Duration::from_secs(env_or("JOB_EXPIRY_SWEEP_SECS", "300")),
            legacy_role_policy: env_or("LEGACY_ROLE_POLICY", "both"),
            jwt: JwtConfig::from_env(),
        };
        if let Err(e) = config.check_timeouts() {
            panic!("{e}");
        }
        config
    }

    /// The gateway deadline must expire before the whole-request deadline.
    pub fn check_timeouts(&self) -> Result<(), String> {
        if self.gateway_timeout >= Duration::from_secs(self.request_timeout_secs) {
            return Err(format!(
                "GATEWAY_TIMEOUT_SECS ({}s) must be less than REQUEST_TIMEOUT_SECS ({}s)",
                self.gateway_timeout.as_secs(),
                self.request_timeout_secs
            ));
        }
        Ok(())
    }
}
