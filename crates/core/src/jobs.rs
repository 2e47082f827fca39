//! Job posting field validation.
//!
//! Used by the lifecycle engine on create and update. Each validator returns
//! a human-readable message on failure.

/// Maximum length of a job title.
pub const TITLE_MAX_LEN: usize = 200;

/// Maximum length of a job location.
pub const LOCATION_MAX_LEN: usize = 200;

/// Maximum length of a job description.
pub const DESCRIPTION_MAX_LEN: usize = 10_000;

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{field} must be at most {max_len} characters"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), String> {
    require_text("title", title, TITLE_MAX_LEN)
}

pub fn validate_description(description: &str) -> Result<(), String> {
    require_text("description", description, DESCRIPTION_MAX_LEN)
}

pub fn validate_location(location: &str) -> Result<(), String> {
    require_text("location", location, LOCATION_MAX_LEN)
}

/// Pay must be a finite, strictly positive amount.
pub fn validate_pay_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err("pay_amount must be a positive number".to_string());
    }
    Ok(())
}

/// Duration is optional; when present it must be positive.
pub fn validate_duration_hours(hours: Option<f64>) -> Result<(), String> {
    match hours {
        Some(h) if !h.is_finite() || h <= 0.0 => {
            Err("duration_hours must be a positive number".to_string())
        }
        _ => Ok(()),
    }
}

/// Validate every required posting field, reporting the first failure.
pub fn validate_posting(
    title: &str,
    description: &str,
    location: &str,
    pay_amount: f64,
    duration_hours: Option<f64>,
) -> Result<(), String> {
    validate_title(title)?;
    validate_description(description)?;
    validate_location(location)?;
    validate_pay_amount(pay_amount)?;
    validate_duration_hours(duration_hours)
}
