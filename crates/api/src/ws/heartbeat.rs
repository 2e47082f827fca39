use std::sync::Arc;
use std::time::Duration;

use qgig_events::ChannelRegistry;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a task that sends a Ping frame to every live connection on a fixed
/// interval.
///
/// Runs until aborted through the returned handle during shutdown.
pub fn start_heartbeat(registry: Arc<ChannelRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = registry.connection_count().await;
            tracing::debug!(count, "WebSocket heartbeat ping");
            registry.ping_all().await;
        }
    })
}
