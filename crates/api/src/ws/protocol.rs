//! Inbound socket frames.

use qgig_core::types::DbId;
use serde::Deserialize;

/// Event name of the frame sent back when an inbound frame fails.
pub const EVENT_ERROR: &str = "error";

/// A frame sent by the client, in the same `{"event", "data"}` envelope the
/// server uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    MarkNotificationRead { notification_id: DbId },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use qgig_core::channels::INBOUND_MARK_NOTIFICATION_READ;

    use super::*;

    #[test]
    fn parses_mark_notification_read() {
        let text = format!(
            r#"{{"event":"{INBOUND_MARK_NOTIFICATION_READ}","data":{{"notification_id":42}}}}"#
        );
        assert_eq!(
            ClientMessage::parse(&text).unwrap(),
            ClientMessage::MarkNotificationRead { notification_id: 42 }
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(ClientMessage::parse(r#"{"event":"subscribe","data":{}}"#).is_err());
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(ClientMessage::parse(r#"{"event":"mark_notification_read","data":{}}"#).is_err());
    }
}
