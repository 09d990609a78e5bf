// Domain value types. Construction is the only way to obtain an
// instance: a value either passes its rule and comes out immutable, or
// the constructor fails with the field and reason. "Editing" a link is
// always building a fresh validated value and sending it to the
// backend, never mutating a record in place.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use crate::validate::{
    is_email, is_username, is_valid_password, validate_expired_at, validate_label, validate_url,
    ValidationError,
};

/// Account name: 1-150 characters from letters, digits and @/./+/-/_.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if is_username(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::new(
                "username",
                "must be 1-150 characters from letters, digits and @/./+/-/_",
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// At least 8 characters, not entirely numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if is_valid_password(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::new(
                "password",
                "must be at least 8 characters and not entirely numeric",
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if is_email(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::new(
                "email",
                "is not a valid email address",
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The destination a short link points at: http(s) with a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget(String);

impl LinkTarget {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_url(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty label, at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_label(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional expiry instant, strictly in the future when present.
/// Validated against the clock at construction time, so editing an
/// expiry always re-runs the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry(Option<NaiveDateTime>);

impl Expiry {
    /// "Never expires".
    pub fn never() -> Self {
        Self(None)
    }

    pub fn at(when: NaiveDateTime) -> Result<Self, ValidationError> {
        validate_expired_at(Some(when)).map(Self)
    }

    pub fn get(&self) -> Option<NaiveDateTime> {
        self.0
    }
}

/// Transient, unsaved set of fields describing a link to be created.
/// Carries no identity; the backend assigns the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDraft {
    pub target: LinkTarget,
    pub label: Label,
    pub expired_at: Expiry,
    pub private: bool,
}

impl LinkDraft {
    pub fn new(target: LinkTarget, label: Label, expired_at: Expiry, private: bool) -> Self {
        Self {
            target,
            label,
            expired_at,
            private,
        }
    }

    /// Validate raw fields in order (target, label, expiry) and build
    /// the draft, stopping at the first violated rule.
    pub fn build(
        target: &str,
        label: &str,
        expired_at: Option<NaiveDateTime>,
        private: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            target: LinkTarget::new(target)?,
            label: Label::new(label)?,
            expired_at: match expired_at {
                Some(when) => Expiry::at(when)?,
                None => Expiry::never(),
            },
            private,
        })
    }
}

impl fmt::Display for LinkDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target.as_str())
    }
}

/// Durable server-side representation of one shortened URL. The code
/// is the identity and is assigned by the backend, never locally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkRecord {
    pub code: String,
    pub target: String,
    pub label: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default, deserialize_with = "de_iso_datetime")]
    pub expired_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de_iso_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de_iso_datetime")]
    pub updated_at: Option<NaiveDateTime>,
}

impl LinkRecord {
    /// Recomputed on demand, never cached.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expired_at.is_some_and(|t| t <= now)
    }
}

// The backend serializes timestamps as ISO 8601, usually with a
// trailing `Z` and sometimes fractional seconds.
fn de_iso_datetime<'de, D>(de: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw {
        None => Ok(None),
        Some(s) => {
            let trimmed = s.trim_end_matches('Z');
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}
