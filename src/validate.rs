// Validation primitives: pure predicates over raw input, plus the
// composite validators used at workflow boundaries. No I/O, no shared
// mutable state, each rule independently testable.

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// A raw value violated one semantic rule. Field and reason are shown
/// to the user verbatim as `field: reason`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

// Usernames mirror the backend's rule: letters, digits and @/./+/-/_.
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("username pattern"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").expect("email pattern")
});

/// Inclusive character-count bounds over the string representation.
pub fn within_length(value: &str, min: usize, max: usize) -> bool {
    let n = value.chars().count();
    n >= min && n <= max
}

pub fn is_username(value: &str) -> bool {
    within_length(value, 1, 150) && USERNAME_RE.is_match(value)
}

/// Password policy: at least 8 characters and not composed entirely of
/// digits. The stricter uppercase+digit+symbol rule is deliberately not
/// applied here.
pub fn is_valid_password(value: &str) -> bool {
    value.chars().count() >= 8 && !value.chars().all(|c| c.is_ascii_digit())
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Structural URL rule: non-empty, http(s) scheme, non-empty host.
/// Each violation carries its own reason.
pub fn validate_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("url", "URL cannot be empty"));
    }
    let rest = if let Some(r) = value.strip_prefix("http://") {
        r
    } else if let Some(r) = value.strip_prefix("https://") {
        r
    } else {
        return Err(ValidationError::new(
            "url",
            "URL must start with http:// or https://",
        ));
    };
    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return Err(ValidationError::new("url", "URL must have a valid domain"));
    }
    Ok(())
}

pub fn validate_label(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("label", "Label cannot be empty"));
    }
    if !within_length(value, 1, 100) {
        return Err(ValidationError::new(
            "label",
            "Label cannot be longer than 100 characters",
        ));
    }
    Ok(())
}

/// Pure core of the expiry rule: `None` means "never expires" and is
/// always valid; a concrete timestamp must be strictly after `now`.
pub fn is_future(value: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    value.map_or(true, |t| t > now)
}

/// Expiry rule against the current wall-clock time. Re-run on every
/// edit: an expiry accepted yesterday may be invalid today.
pub fn validate_expired_at(
    value: Option<NaiveDateTime>,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    if is_future(value, Local::now().naive_local()) {
        Ok(value)
    } else {
        Err(ValidationError::new(
            "expired_at",
            "Expiration date must be in the future",
        ))
    }
}
