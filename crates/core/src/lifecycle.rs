//! Job and interest state machines.
//!
//! ```text
//! OPEN ──> ASSIGNED ──> COMPLETED
//!  │  <──┘    │
//!  ├──────────┴──> CANCELLED
//!  └──────────┴──> CLOSED
//! ```
//!
//! `ASSIGNED -> OPEN` happens only when the assigned professional withdraws.
//! COMPLETED, CANCELLED and CLOSED are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StateConflict;

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Cancelled,
    Closed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Closed)
    }

    /// `assigned_professional_id` must be set iff this returns true.
    pub fn requires_assignee(self) -> bool {
        matches!(self, Self::Assigned | Self::Completed)
    }

    /// Only gigs with an assigned professional can be paid for.
    pub fn is_payable(self) -> bool {
        self.requires_assignee()
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Open, Assigned)
                | (Assigned, Completed)
                | (Assigned, Open)
                | (Open | Assigned, Cancelled)
                | (Open | Assigned, Closed)
        )
    }

    /// Validate a move to `next`, returning the new status.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, StateConflict> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateConflict::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "assigned" => Ok(Self::Assigned),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "closed" => Ok(Self::Closed),
            other => Err(format!("Unknown job status '{other}'")),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Interest status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Declined,
}

impl InterestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(format!("Unknown interest status '{other}'")),
        }
    }
}

impl TryFrom<String> for InterestStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Institution decision on an interest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    pub fn resulting_status(self) -> InterestStatus {
        match self {
            Self::Accept => InterestStatus::Accepted,
            Self::Decline => InterestStatus::Declined,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    /// `reject` is accepted as a synonym for `decline`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "decline" | "reject" => Ok(Self::Decline),
            other => Err(format!(
                "Invalid action '{other}'. Must be one of: accept, decline"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ALL: [JobStatus; 5] = [
        JobStatus::Open,
        JobStatus::Assigned,
        JobStatus::Completed,
        JobStatus::Cancelled,
        JobStatus::Closed,
    ];

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(JobStatus::Open.can_transition_to(JobStatus::Assigned));
        assert!(JobStatus::Assigned.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn side_exits_from_open_and_assigned() {
        for from in [JobStatus::Open, JobStatus::Assigned] {
            assert!(from.can_transition_to(JobStatus::Cancelled));
            assert!(from.can_transition_to(JobStatus::Closed));
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn open_cannot_complete_directly() {
        assert_matches!(
            JobStatus::Open.transition(JobStatus::Completed),
            Err(StateConflict::InvalidTransition {
                from: JobStatus::Open,
                to: JobStatus::Completed
            })
        );
    }

    #[test]
    fn assigned_can_reopen() {
        assert_eq!(JobStatus::Assigned.transition(JobStatus::Open), Ok(JobStatus::Open));
    }

    #[test]
    fn assignee_required_only_for_assigned_and_completed() {
        let requiring: Vec<_> = ALL.into_iter().filter(|s| s.requires_assignee()).collect();
        assert_eq!(requiring, vec![JobStatus::Assigned, JobStatus::Completed]);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert!("pending".parse::<JobStatus>().is_err());
    }

    #[test]
    fn decision_accepts_reject_synonym() {
        assert_eq!("accept".parse(), Ok(Decision::Accept));
        assert_eq!("Decline".parse(), Ok(Decision::Decline));
        assert_eq!("reject".parse(), Ok(Decision::Decline));
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn decision_deserializes_from_json() {
        #[derive(Deserialize)]
        struct Body {
            action: Decision,
        }
        let body: Body = serde_json::from_str(r#"{"action":"reject"}"#).unwrap();
        assert_eq!(body.action, Decision::Decline);
        assert!(serde_json::from_str::<Body>(r#"{"action":"later"}"#).is_err());
    }

    #[test]
    fn decision_maps_to_interest_status() {
        assert_eq!(Decision::Accept.resulting_status(), InterestStatus::Accepted);
        assert_eq!(Decision::Decline.resulting_status(), InterestStatus::Declined);
    }
}
