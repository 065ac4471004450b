//! Allow-list validation for free-text form input.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::limits::{MAX_TEXT_LEN, MIN_ANSWER_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} contains invalid characters!")]
    InvalidCharacters { field: &'static str },

    #[error("{field} must be at least {min} characters long.")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be {max} characters or less.")]
    TooLong { field: &'static str, max: usize },
}

/// Letters, digits, whitespace and `. , ! ? -`.
#[must_use]
pub fn is_allowed_text(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[\w\s.,!?-]*$").expect("Invalid regex"));
    re.is_match(text)
}

fn check_allowed(field: &'static str, text: &str) -> Result<(), ValidationError> {
    if is_allowed_text(text) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCharacters { field })
    }
}

fn check_max_len(field: &'static str, text: &str) -> Result<(), ValidationError> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Answer text saved on the question form.
pub fn validate_answer(answer: &str) -> Result<&str, ValidationError> {
    check_allowed("Answer", answer)?;
    if answer.chars().count() < MIN_ANSWER_LEN {
        return Err(ValidationError::TooShort {
            field: "Answer",
            min: MIN_ANSWER_LEN,
        });
    }
    check_max_len("Answer", answer)?;
    Ok(answer)
}

/// Candidate answer on the challenge form. No minimum length, a short
/// candidate simply fails to match.
pub fn validate_challenge_answer(answer: &str) -> Result<&str, ValidationError> {
    check_allowed("Answer", answer)?;
    Ok(answer)
}

pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    check_allowed("Username", username)?;
    Ok(username)
}

pub fn validate_note(note: &str) -> Result<&str, ValidationError> {
    check_allowed("Note", note)?;
    check_max_len("Note", note)?;
    Ok(note)
}
