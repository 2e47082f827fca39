//! Wording of persisted notifications.
//!
//! Every lifecycle side effect that notifies a user builds its title and
//! message here so the text stays consistent across engines.

use crate::lifecycle::Decision;

/// Maximum stored title length (matches the `notifications.title` column).
pub const TITLE_MAX_LEN: usize = 200;

/// Title and body of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationText {
    pub title: String,
    pub message: String,
}

impl NotificationText {
    fn new(title: &str, message: String) -> Self {
        Self {
            title: truncate(title, TITLE_MAX_LEN),
            message,
        }
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn interest_expressed(professional_name: &str, job_title: &str) -> NotificationText {
    NotificationText::new(
        "New Interest in Your Job",
        format!("{professional_name} has expressed interest in your job: {job_title}"),
    )
}

pub fn interest_withdrawn(professional_name: &str, job_title: &str) -> NotificationText {
    NotificationText::new(
        "Interest Withdrawn",
        format!("{professional_name} has withdrawn their interest in your job: {job_title}"),
    )
}

pub fn interest_decided(
    decision: Decision,
    job_title: &str,
    institution_name: &str,
) -> NotificationText {
    match decision {
        Decision::Accept => NotificationText::new(
            "Interest Accepted!",
            format!("Your interest in '{job_title}' has been accepted by {institution_name}."),
        ),
        Decision::Decline => NotificationText::new(
            "Interest Declined",
            format!("Your interest in '{job_title}' has been declined by {institution_name}."),
        ),
    }
}

/// Sent to every other pending applicant when a gig is filled.
pub fn position_filled(job_title: &str) -> NotificationText {
    NotificationText::new(
        "Interest Declined",
        format!("The position for '{job_title}' has been filled."),
    )
}

/// Sent to applicants restored to pending when the assignee withdraws.
pub fn gig_reopened(job_title: &str) -> NotificationText {
    NotificationText::new(
        "Gig Reopened",
        format!("'{job_title}' is open again and your interest is back under review."),
    )
}

pub fn gig_removed(job_title: &str) -> NotificationText {
    NotificationText::new(
        "Gig No Longer Available",
        format!("The gig \"{job_title}\" is no longer available."),
    )
}

pub fn gig_assigned(job_title: &str, institution_name: &str) -> NotificationText {
    NotificationText::new(
        "Gig Assigned",
        format!("You have been assigned to '{job_title}' by {institution_name}."),
    )
}

pub fn gig_completed(job_title: &str) -> NotificationText {
    NotificationText::new(
        "Gig Completed",
        format!("Gig '{job_title}' has been marked as completed! Payment pending."),
    )
}

pub fn gig_cancelled(job_title: &str, institution_name: &str) -> NotificationText {
    NotificationText::new(
        "Gig Cancelled",
        format!("{institution_name} has cancelled the gig '{job_title}'."),
    )
}

pub fn payment_received(amount: f64, currency: &str, job_title: &str) -> NotificationText {
    NotificationText::new(
        "Payment Received",
        format!("Payment of {currency} {amount:.2} for '{job_title}' has been completed."),
    )
}

pub fn rating_received(score: i16, job_title: &str) -> NotificationText {
    NotificationText::new(
        "New Rating",
        format!("You received a {score}-star rating for '{job_title}'."),
    )
}

pub fn new_message(sender_name: &str) -> NotificationText {
    NotificationText::new(
        "New Message",
        format!("You have a new message from {sender_name}."),
    )
}

pub fn document_reviewed(document_type: &str, approved: bool) -> NotificationText {
    if approved {
        NotificationText::new(
            "Document Approved",
            format!("Your {document_type} document has been approved."),
        )
    } else {
        NotificationText::new(
            "Document Rejected",
            format!("Your {document_type} document has been rejected."),
        )
    }
}

/// Body of the message an institution sends when it accepts a professional.
pub fn welcome_message(job_title: &str, institution_name: &str) -> (String, String) {
    (
        format!("Welcome aboard: {job_title}"),
        format!(
            "Hello! {institution_name} has accepted your interest in '{job_title}'. \
             We will be in touch with the details."
        ),
    )
}
