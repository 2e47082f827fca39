//! Role names and switch eligibility.
//!
//! These must match the seed data in `20260301000002_create_roles.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_PROFESSIONAL: &str = "professional";
pub const ROLE_INSTITUTION: &str = "institution";
pub const ROLE_ADMIN: &str = "admin";

/// A named capability a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Professional,
    Institution,
    Admin,
}

impl RoleName {
    /// The two roles a user may operate the marketplace as.
    pub const MARKET_ROLES: [RoleName; 2] = [RoleName::Professional, RoleName::Institution];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => ROLE_PROFESSIONAL,
            Self::Institution => ROLE_INSTITUTION,
            Self::Admin => ROLE_ADMIN,
        }
    }

    /// Whether a user may switch their active role to this one.
    ///
    /// Admin is granted, never switched into.
    pub fn is_switchable(self) -> bool {
        !matches!(self, Self::Admin)
    }

    /// Whether this role is backed by a marketplace profile row.
    pub fn has_profile(self) -> bool {
        matches!(self, Self::Professional | Self::Institution)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_PROFESSIONAL => Ok(Self::Professional),
            ROLE_INSTITUTION => Ok(Self::Institution),
            ROLE_ADMIN => Ok(Self::Admin),
            other => Err(format!(
                "Unknown role '{other}'. Must be one of: {ROLE_PROFESSIONAL}, {ROLE_INSTITUTION}, {ROLE_ADMIN}"
            )),
        }
    }
}

impl TryFrom<String> for RoleName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_case_insensitively() {
        assert_eq!("professional".parse(), Ok(RoleName::Professional));
        assert_eq!("Institution".parse(), Ok(RoleName::Institution));
        assert_eq!(" ADMIN ".parse(), Ok(RoleName::Admin));
    }

    #[test]
    fn rejects_unknown_role() {
        let err = "nurse".parse::<RoleName>().unwrap_err();
        assert!(err.contains("Unknown role 'nurse'"));
    }

    #[test]
    fn admin_is_not_switchable() {
        assert!(!RoleName::Admin.is_switchable());
        assert!(RoleName::Professional.is_switchable());
        assert!(RoleName::Institution.is_switchable());
    }

    #[test]
    fn only_market_roles_have_profiles() {
        assert!(RoleName::Professional.has_profile());
        assert!(RoleName::Institution.has_profile());
        assert!(!RoleName::Admin.has_profile());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&RoleName::Institution).unwrap();
        assert_eq!(json, "\"institution\"");
        let back: RoleName = serde_json::from_str("\"professional\"").unwrap();
        assert_eq!(back, RoleName::Professional);
    }

    #[test]
    fn display_matches_as_str() {
        for role in [RoleName::Professional, RoleName::Institution, RoleName::Admin] {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
