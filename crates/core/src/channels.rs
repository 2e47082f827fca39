//! Real-time channel keys and event names.
//!
//! Every authenticated connection joins its personal `user_{id}` channel and,
//! when operating as a market role, the matching `institution_{id}` or
//! `professional_{id}` channel keyed by profile id.

use std::fmt;

use crate::roles::RoleName;
use crate::types::DbId;

/// A new persisted notification for the channel's user.
pub const EVENT_NOTIFICATION: &str = "notification";

/// A professional expressed interest in one of the institution's gigs.
pub const EVENT_JOB_INTEREST_SENT: &str = "job_interest_sent";

/// An institution accepted or declined an interest.
pub const EVENT_INTEREST_DECISION: &str = "interest_decision";

/// A gig changed market status (closed, cancelled, expired, reopened).
pub const EVENT_GIG_UPDATE: &str = "gig_update";

/// A direct message arrived.
pub const EVENT_NEW_MESSAGE: &str = "new_message";

/// Echo after a notification was marked read over the socket.
pub const EVENT_NOTIFICATION_READ: &str = "notification_read";

/// First frame sent after a connection is registered.
pub const EVENT_CONNECTED: &str = "connected";

/// A payment changed status.
pub const EVENT_PAYMENT_UPDATE: &str = "payment_update";

/// Inbound socket message asking to mark a notification read.
pub const INBOUND_MARK_NOTIFICATION_READ: &str = "mark_notification_read";

/// A logical broadcast group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    User(DbId),
    Institution(DbId),
    Professional(DbId),
}

impl ChannelKey {
    /// Role-scoped channel for a market role's profile id.
    ///
    /// Returns `None` for roles without a profile (admin).
    pub fn for_role(role: RoleName, profile_id: DbId) -> Option<ChannelKey> {
        match role {
            RoleName::Institution => Some(Self::Institution(profile_id)),
            RoleName::Professional => Some(Self::Professional(profile_id)),
            RoleName::Admin => None,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user_{id}"),
            Self::Institution(id) => write!(f, "institution_{id}"),
            Self::Professional(id) => write!(f, "professional_{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names() {
        assert_eq!(ChannelKey::User(3).to_string(), "user_3");
        assert_eq!(ChannelKey::Institution(9).to_string(), "institution_9");
        assert_eq!(ChannelKey::Professional(12).to_string(), "professional_12");
    }

    #[test]
    fn role_scoped_channel() {
        assert_eq!(
            ChannelKey::for_role(RoleName::Institution, 4),
            Some(ChannelKey::Institution(4))
        );
        assert_eq!(
            ChannelKey::for_role(RoleName::Professional, 4),
            Some(ChannelKey::Professional(4))
        );
        assert_eq!(ChannelKey::for_role(RoleName::Admin, 4), None);
    }

    #[test]
    fn user_and_profile_channels_never_collide() {
        assert_ne!(ChannelKey::User(1), ChannelKey::Institution(1));
        assert_ne!(
            ChannelKey::Institution(1).to_string(),
            ChannelKey::Professional(1).to_string()
        );
    }
}
