//! Pushes deferred until a unit of work has committed.
//!
//! Engines collect events in an [`Outbox`] while the transaction is open and
//! hand it back to the caller together with the result. The caller flushes
//! it only after `commit` succeeded, so a client that reacts to a push always
//! finds the committed rows. Flushing never fails: transport errors are
//! logged and dropped.

use qgig_core::channels::ChannelKey;

use crate::event::RealtimeEvent;
use crate::transport::ChannelTransport;

#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<RealtimeEvent>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: ChannelKey, event: &str, payload: serde_json::Value) {
        self.events.push(RealtimeEvent::new(channel, event, payload));
    }

    /// Append everything from another outbox, keeping order.
    pub fn extend(&mut self, other: Outbox) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[RealtimeEvent] {
        &self.events
    }

    /// Publish every queued event in order. Returns how many connections
    /// received something in total.
    pub async fn flush(self, transport: &dyn ChannelTransport) -> usize {
        let mut delivered = 0;
        for event in &self.events {
            match transport.publish(event).await {
                Ok(count) => {
                    tracing::debug!(
                        channel = %event.channel,
                        event = %event.event,
                        connections = count,
                        "Real-time push",
                    );
                    delivered += count;
                }
                Err(e) => {
                    tracing::warn!(
                        channel = %event.channel,
                        event = %event.event,
                        error = %e,
                        "Real-time push failed",
                    );
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::registry::{ChannelRegistry, Outbound};
    use crate::transport::TransportError;

    /// Fails every other publish and records what it saw.
    #[derive(Default)]
    struct FlakyTransport {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelTransport for FlakyTransport {
        async fn join(&self, _: &str, _: ChannelKey) -> Result<(), TransportError> {
            Ok(())
        }

        async fn leave(&self, _: &str, _: ChannelKey) -> Result<(), TransportError> {
            Ok(())
        }

        async fn publish(&self, event: &RealtimeEvent) -> Result<usize, TransportError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(event.event.clone());
            if seen.len() % 2 == 0 {
                Err(TransportError::UnknownConnection("gone".into()))
            } else {
                Ok(1)
            }
        }
    }

    #[tokio::test]
    async fn flush_delivers_in_order() {
        let registry = ChannelRegistry::new();
        let mut rx = registry.register("c1".into(), 1).await;
        registry.join("c1", ChannelKey::User(1)).await.unwrap();

        let mut outbox = Outbox::new();
        outbox.push(ChannelKey::User(1), "first", serde_json::json!({}));
        outbox.push(ChannelKey::User(1), "second", serde_json::json!({}));
        outbox.push(ChannelKey::User(2), "elsewhere", serde_json::json!({}));

        assert_eq!(outbox.flush(&registry).await, 2);
        let Some(Outbound::Text(first)) = rx.recv().await else {
            panic!("expected a text frame");
        };
        assert!(first.contains("\"event\":\"first\""));
        let Some(Outbound::Text(second)) = rx.recv().await else {
            panic!("expected a text frame");
        };
        assert!(second.contains("\"event\":\"second\""));
    }

    #[tokio::test]
    async fn flush_continues_past_transport_errors() {
        let transport = FlakyTransport::default();
        let mut outbox = Outbox::new();
        for name in ["a", "b", "c"] {
            outbox.push(ChannelKey::User(1), name, serde_json::json!({}));
        }

        assert_eq!(outbox.flush(&transport).await, 2);
        assert_eq!(*transport.seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn extend_keeps_order() {
        let mut first = Outbox::new();
        first.push(ChannelKey::User(1), "a", serde_json::json!({}));
        let mut second = Outbox::new();
        second.push(ChannelKey::User(1), "b", serde_json::json!({}));
        first.extend(second);

        let names: Vec<&str> = first.events().iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(first.len(), 2);
        assert!(!first.is_empty());
    }
}
