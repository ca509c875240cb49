//! Contact form validation and sanitization.
//!
//! Fields are trimmed before any check, so whitespace-only input counts as
//! missing. The email check mirrors `^[^\s@]+@[^\s@]+\.[^\s@]+$`: it is
//! deliberately permissive and makes no attempt at RFC 5322.

use serde::Deserialize;
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_EMAIL_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Raw form payload as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trimmed, length-bounded submission ready to be mailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Client-facing validation failures. Display text is sent back verbatim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingField,

    #[error("Please provide a valid email address.")]
    InvalidEmail,
}

pub fn validate(submission: &Submission) -> Result<SanitizedSubmission, ValidationError> {
    let name = required(submission.name.as_deref())?;
    let email = required(submission.email.as_deref())?;
    let message = required(submission.message.as_deref())?;

    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(SanitizedSubmission {
        name: truncate(name, MAX_NAME_CHARS),
        email: truncate(email, MAX_EMAIL_CHARS),
        message: truncate(message, MAX_MESSAGE_CHARS),
    })
}

fn required(field: Option<&str>) -> Result<&str, ValidationError> {
    match field.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField),
    }
}

// local@domain.tld with no whitespace and exactly one '@'
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // some dot with at least one char on each side
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// Cut to at most `max` chars, never splitting a code point
fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
