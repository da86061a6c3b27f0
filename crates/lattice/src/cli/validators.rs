//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::{IssueId, MAX_TITLE_LENGTH};

/// Validate issue ID prefix format.
///
/// Delegates to `commands::init` so the rules live in one place.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate issue ID format.
///
/// Expected format: `prefix-suffix`, both alphanumeric, e.g. `proj-a3f8`.
pub fn validate_issue_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Issue ID cannot be empty".to_string());
    }

    let Some((prefix, _)) = s.split_once('-') else {
        return Err(format!(
            "Invalid issue ID format: '{s}'. Expected format: prefix-suffix (e.g., proj-a3f8)"
        ));
    };
    validate_prefix(prefix).map_err(|e| format!("Issue ID {}", e.to_lowercase()))?;

    if IssueId::new(s).project().is_none() {
        return Err("Issue ID suffix must be one or more alphanumeric characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate title length.
///
/// Title must not exceed MAX_TITLE_LENGTH (200 characters).
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    if s.len() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {} characters",
            s.len()
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    Ok(s.to_string())
}
