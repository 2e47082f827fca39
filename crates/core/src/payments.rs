//! Payment status rules and merchant reference generation.
//!
//! Payment status only ever moves forward: PENDING to one of the terminal
//! states. A terminal status never changes again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix of every merchant reference sent to the gateway.
pub const MERCHANT_REFERENCE_PREFIX: &str = "QGIG-";

/// Number of hex characters following the prefix.
pub const MERCHANT_REFERENCE_HEX_LEN: usize = 12;

/// Description attached to every order submitted to the gateway.
pub const ORDER_DESCRIPTION: &str = "Qgig Payment";

/// Phone number sent when the payer has none on file.
pub const DEFAULT_PAYER_PHONE: &str = "0700000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Map the gateway's status vocabulary onto the internal enum.
    ///
    /// Returns `None` for descriptions that do not settle the payment
    /// (e.g. still processing), leaving the payment pending.
    pub fn from_external(description: &str) -> Option<PaymentStatus> {
        match description.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether `self -> next` is a forward move.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        self == Self::Pending && next.is_terminal()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown payment status '{other}'")),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Generate a fresh merchant reference, e.g. `QGIG-3FA85F6457B2`.
pub fn generate_merchant_reference() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{MERCHANT_REFERENCE_PREFIX}{}",
        hex[..MERCHANT_REFERENCE_HEX_LEN].to_ascii_uppercase()
    )
}

/// Split a display name into `(first, last)` for the gateway billing block.
pub fn split_payer_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_vocabulary_is_case_insensitive() {
        assert_eq!(PaymentStatus::from_external("Completed"), Some(PaymentStatus::Completed));
        assert_eq!(PaymentStatus::from_external(" FAILED "), Some(PaymentStatus::Failed));
        assert_eq!(PaymentStatus::from_external("cancelled"), Some(PaymentStatus::Cancelled));
    }

    #[test]
    fn unknown_external_status_leaves_payment_pending() {
        assert_eq!(PaymentStatus::from_external("INVALID"), None);
        assert_eq!(PaymentStatus::from_external(""), None);
    }

    #[test]
    fn status_is_monotonic() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Completed));
    }

    #[test]
    fn merchant_reference_shape() {
        let reference = generate_merchant_reference();
        assert!(reference.starts_with(MERCHANT_REFERENCE_PREFIX));
        let suffix = &reference[MERCHANT_REFERENCE_PREFIX.len()..];
        assert_eq!(suffix.len(), MERCHANT_REFERENCE_HEX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn merchant_references_are_unique() {
        assert_ne!(generate_merchant_reference(), generate_merchant_reference());
    }

    #[test]
    fn payer_name_split() {
        assert_eq!(
            split_payer_name("Grace Nakato Ssali"),
            ("Grace".to_string(), "Nakato Ssali".to_string())
        );
        assert_eq!(split_payer_name("Mulago"), ("Mulago".to_string(), String::new()));
        assert_eq!(split_payer_name(""), (String::new(), String::new()));
    }
}
