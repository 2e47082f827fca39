use std::sync::Arc;

use qgig_db::Store;
use qgig_events::{ChannelRegistry, ChannelTransport};
use qgig_payments::PaymentGateway;

use crate::auth::roles::RoleResolver;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Transactional persistence.
    pub store: Arc<dyn Store>,
    /// Live real-time connections and their channel memberships.
    pub registry: Arc<ChannelRegistry>,
    /// Payment provider client.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Role resolution policy.
    pub resolver: RoleResolver,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        config: ServerConfig,
    ) -> Self {
        Self {
            store,
            registry: Arc::new(ChannelRegistry::new()),
            gateway,
            resolver: RoleResolver::new(config.legacy_role_policy),
            config: Arc::new(config),
        }
    }

    /// The transport post-commit pushes go through.
    pub fn transport(&self) -> &dyn ChannelTransport {
        self.registry.as_ref()
    }
}
