//! Rating score bounds and aggregation.

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// Maximum length of free-text feedback.
pub const FEEDBACK_MAX_LEN: usize = 2_000;

pub fn validate_score(score: i16) -> Result<(), String> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(format!("rating must be between {MIN_SCORE} and {MAX_SCORE}"))
    }
}

pub fn validate_feedback(feedback: Option<&str>) -> Result<(), String> {
    match feedback {
        Some(text) if text.chars().count() > FEEDBACK_MAX_LEN => Err(format!(
            "feedback must be at most {FEEDBACK_MAX_LEN} characters"
        )),
        _ => Ok(()),
    }
}

/// Mean score rounded to one decimal place, or `None` when unrated.
pub fn average(scores: &[i16]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: f64 = scores.iter().map(|&s| f64::from(s)).sum();
    let mean = sum / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
