//! Event envelope pushed to real-time channels.

use chrono::{DateTime, Utc};
use qgig_core::channels::ChannelKey;
use serde::Serialize;

/// An event addressed to one channel.
///
/// Built with [`RealtimeEvent::new`]; the payload is free-form JSON owned by
/// the emitting engine.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub channel: ChannelKey,
    /// Event name, e.g. `"notification"` or `"gig_update"`.
    pub event: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// The JSON text frame a client receives.
#[derive(Serialize)]
struct WireFrame<'a> {
    event: &'a str,
    room: String,
    data: &'a serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    pub fn new(channel: ChannelKey, event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel,
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Encode as the client-facing frame:
    /// `{"event": .., "room": .., "data": .., "timestamp": ..}`.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireFrame {
            event: &self.event,
            room: self.channel.to_string(),
            data: &self.payload,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_carries_room_and_data() {
        let event = RealtimeEvent::new(
            ChannelKey::Institution(7),
            "job_interest_sent",
            serde_json::json!({"job_id": 3}),
        );
        let frame: serde_json::Value = serde_json::from_str(&event.to_frame().unwrap()).unwrap();
        assert_eq!(frame["event"], "job_interest_sent");
        assert_eq!(frame["room"], "institution_7");
        assert_eq!(frame["data"]["job_id"], 3);
        assert!(frame["timestamp"].is_string());
    }
}
