//! Direct message validation.

/// Maximum message body length.
pub const CONTENT_MAX_LEN: usize = 5_000;

/// Maximum subject length.
pub const SUBJECT_MAX_LEN: usize = 200;

pub const STATUS_SENT: &str = "sent";
pub const STATUS_READ: &str = "read";

pub fn validate_content(content: &str) -> Result<(), String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("message content is required".to_string());
    }
    if trimmed.chars().count() > CONTENT_MAX_LEN {
        return Err(format!(
            "message content must be at most {CONTENT_MAX_LEN} characters"
        ));
    }
    Ok(())
}

pub fn validate_subject(subject: Option<&str>) -> Result<(), String> {
    match subject {
        Some(s) if s.chars().count() > SUBJECT_MAX_LEN => Err(format!(
            "subject must be at most {SUBJECT_MAX_LEN} characters"
        )),
        _ => Ok(()),
    }
}
