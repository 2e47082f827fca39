//! Verification document types and review statuses.
//!
//! Documents are uploaded by professionals (national id, certificates,
//! licences, CVs) and reviewed by an admin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Nin,
    Certificate,
    License,
    Cv,
    ProfilePicture,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nin => "nin",
            Self::Certificate => "certificate",
            Self::License => "license",
            Self::Cv => "cv",
            Self::ProfilePicture => "profile_picture",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nin" => Ok(Self::Nin),
            "certificate" => Ok(Self::Certificate),
            "license" => Ok(Self::License),
            "cv" => Ok(Self::Cv),
            "profile_picture" => Ok(Self::ProfilePicture),
            other => Err(format!("Unknown document type '{other}'")),
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("Unknown document status '{other}'")),
        }
    }
}

impl TryFrom<String> for DocumentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Maximum accepted file name length.
pub const FILE_NAME_MAX_LEN: usize = 255;

pub fn validate_file_reference(file_path: &str, file_name: &str) -> Result<(), String> {
    if file_path.trim().is_empty() {
        return Err("file_path is required".to_string());
    }
    if file_name.trim().is_empty() {
        return Err("file_name is required".to_string());
    }
    if file_name.chars().count() > FILE_NAME_MAX_LEN {
        return Err(format!(
            "file_name must be at most {FILE_NAME_MAX_LEN} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_round_trip() {
        for t in [
            DocumentType::Nin,
            DocumentType::Certificate,
            DocumentType::License,
            DocumentType::Cv,
            DocumentType::ProfilePicture,
        ] {
            assert_eq!(t.as_str().parse::<DocumentType>(), Ok(t));
        }
    }

    #[test]
    fn document_type_serde_is_snake_case() {
        let json = serde_json::to_string(&DocumentType::ProfilePicture).unwrap();
        assert_eq!(json, "\"profile_picture\"");
    }

    #[test]
    fn file_reference_requires_path_and_name() {
        assert!(validate_file_reference("", "cv.pdf").is_err());
        assert!(validate_file_reference("uploads/1/cv.pdf", " ").is_err());
        assert!(validate_file_reference("uploads/1/cv.pdf", "cv.pdf").is_ok());
    }
}
