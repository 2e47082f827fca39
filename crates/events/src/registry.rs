//! Connection registry and room membership.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use qgig_core::channels::ChannelKey;
use qgig_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use crate::event::RealtimeEvent;
use crate::transport::{ChannelTransport, TransportError};

/// A frame queued for one connection. The socket task turns these into
/// WebSocket messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Encoded JSON text frame.
    Text(Arc<str>),
    Ping,
    Close,
}

/// Sender half of a connection's outbound queue.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Metadata for a single live connection.
struct Connection {
    user_id: DbId,
    sender: OutboundSender,
    rooms: HashSet<ChannelKey>,
    connected_at: Timestamp,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<String, Connection>,
    rooms: HashMap<ChannelKey, HashSet<String>>,
}

impl Inner {
    fn detach(&mut self, conn_id: &str, channel: ChannelKey) {
        if let Some(members) = self.rooms.get_mut(&channel) {
            members.remove(conn_id);
            if members.is_empty() {
                self.rooms.remove(&channel);
            }
        }
    }
}

/// Tracks every live connection and which rooms it has joined.
///
/// Thread-safe via interior `RwLock`; shared as `Arc<ChannelRegistry>`.
#[derive(Default)]
pub struct ChannelRegistry {
    inner: RwLock<Inner>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for an authenticated user.
    ///
    /// Returns the receiver half of its outbound queue; the socket task
    /// forwards everything it receives to the client.
    pub async fn register(
        &self,
        conn_id: String,
        user_id: DbId,
    ) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            user_id,
            sender: tx,
            rooms: HashSet::new(),
            connected_at: chrono::Utc::now(),
        };
        self.inner.write().await.connections.insert(conn_id, conn);
        rx
    }

    /// Drop a connection and all of its memberships.
    ///
    /// Safe to call more than once; returns `false` when already removed.
    pub async fn remove(&self, conn_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let Some(conn) = inner.connections.remove(conn_id) else {
            return false;
        };
        for channel in conn.rooms {
            inner.detach(conn_id, channel);
        }
        true
    }

    /// Connection ids currently joined to `channel`.
    pub async fn members(&self, channel: ChannelKey) -> Vec<String> {
        self.inner
            .read()
            .await
            .rooms
            .get(&channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Connection ids belonging to a user.
    pub async fn connections_for_user(&self, user_id: DbId) -> Vec<String> {
        self.inner
            .read()
            .await
            .connections
            .iter()
            .filter(|(_, conn)| conn.user_id == user_id)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Queue a frame on a single connection.
    pub async fn send_to(&self, conn_id: &str, frame: Outbound) -> Result<(), TransportError> {
        let inner = self.inner.read().await;
        let conn = inner
            .connections
            .get(conn_id)
            .ok_or_else(|| TransportError::UnknownConnection(conn_id.to_string()))?;
        let _ = conn.sender.send(frame);
        Ok(())
    }

    /// When a connection was registered.
    pub async fn connected_at(&self, conn_id: &str) -> Option<Timestamp> {
        self.inner
            .read()
            .await
            .connections
            .get(conn_id)
            .map(|conn| conn.connected_at)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    pub async fn room_count(&self) -> usize {
        self.inner.read().await.rooms.len()
    }

    /// Send a Ping to every connection.
    pub async fn ping_all(&self) {
        let inner = self.inner.read().await;
        for conn in inner.connections.values() {
            let _ = conn.sender.send(Outbound::Ping);
        }
    }

    /// Send Close to every connection, then clear all state.
    pub async fn shutdown_all(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.connections.len();
        for conn in inner.connections.values() {
            let _ = conn.sender.send(Outbound::Close);
        }
        inner.connections.clear();
        inner.rooms.clear();
        tracing::info!(count, "Closed all real-time connections");
    }
}

#[async_trait]
impl ChannelTransport for ChannelRegistry {
    async fn join(&self, conn_id: &str, channel: ChannelKey) -> Result<(), TransportError> {
        let mut inner = self.inner.write().await;
        let conn = inner
            .connections
            .get_mut(conn_id)
            .ok_or_else(|| TransportError::UnknownConnection(conn_id.to_string()))?;
        conn.rooms.insert(channel);
        inner
            .rooms
            .entry(channel)
            .or_default()
            .insert(conn_id.to_string());
        Ok(())
    }

    async fn leave(&self, conn_id: &str, channel: ChannelKey) -> Result<(), TransportError> {
        let mut inner = self.inner.write().await;
        let conn = inner
            .connections
            .get_mut(conn_id)
            .ok_or_else(|| TransportError::UnknownConnection(conn_id.to_string()))?;
        conn.rooms.remove(&channel);
        inner.detach(conn_id, channel);
        Ok(())
    }

    async fn publish(&self, event: &RealtimeEvent) -> Result<usize, TransportError> {
        let frame: Arc<str> = event.to_frame()?.into();
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&event.channel) else {
            return Ok(0);
        };

        let mut delivered = 0;
        for conn_id in members {
            let Some(conn) = inner.connections.get(conn_id) else {
                continue;
            };
            // A closed queue means the socket task is exiting; it removes
            // itself on the way out.
            if conn.sender.send(Outbound::Text(Arc::clone(&frame))).is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
