// ABOUTME: Input validation for email requests, storage keys and free-text fields
// ABOUTME: Rejects malformed paths, invalid addresses and oversized strings before any side effect

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::constants::MAX_STORAGE_KEY_LEN;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap();
    static ref KEY_SEGMENT_RE: Regex = Regex::new(r"^[A-Za-z0-9._\-]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Malformed storage path: {0}")]
    MalformedPath(String),

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("Invalid {kind}: {value}. Must be one of: {allowed}")]
    InvalidEnum {
        kind: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("Render inputs for {number} do not describe document {document_id}")]
    DocumentMismatch { document_id: String, number: String },
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.len() > 254 || !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Validate that a field is not blank
pub fn validate_required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

/// Validate a free-text field against a character limit
pub fn validate_length(value: &str, field: &'static str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validate an artifact storage key
///
/// Keys are relative, `/`-separated, and every segment is limited to
/// `[A-Za-z0-9._-]`. `.` and `..` segments are rejected so a key can never
/// escape the store root.
pub fn validate_storage_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.len() > MAX_STORAGE_KEY_LEN {
        return Err(ValidationError::MalformedPath(key.to_string()));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(ValidationError::MalformedPath(key.to_string()));
    }

    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ValidationError::MalformedPath(key.to_string()));
        }
        if !KEY_SEGMENT_RE.is_match(segment) {
            return Err(ValidationError::MalformedPath(key.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("anna.berg@robotics.example").is_ok());
        assert!(validate_email("ops+alerts@example.co.uk").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        for bad in ["", "no-at-sign", "a@b", "x@y.z", "<script>@x.com", "a b@c.com"] {
            assert!(
                matches!(validate_email(bad), Err(ValidationError::InvalidEmail(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_storage_key_rejects_traversal() {
        assert!(validate_storage_key("off-abc/OF-2024-001_v1_x1.pdf").is_ok());
        assert!(validate_storage_key("../etc/passwd").is_err());
        assert!(validate_storage_key("/absolute/key.pdf").is_err());
        assert!(validate_storage_key("a//b.pdf").is_err());
        assert!(validate_storage_key("a/./b.pdf").is_err());
        assert!(validate_storage_key("a/b c.pdf").is_err());
        assert!(validate_storage_key("").is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(validate_length("ÄÖÜ", "name", 3).is_ok());
        assert_eq!(
            validate_length("abcd", "name", 3),
            Err(ValidationError::TooLong {
                field: "name",
                max: 3
            })
        );
    }

    #[test]
    fn test_required_rejects_whitespace() {
        assert_eq!(
            validate_required("   ", "recipient"),
            Err(ValidationError::Empty("recipient"))
        );
    }
}
