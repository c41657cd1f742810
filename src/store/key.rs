//! Validated `YYYY-MM-DD` document keys.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::StoreError;

/// Full-string date key pattern. Calendar validity is not checked.
static DATE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// A key known to match `YYYY-MM-DD`.
///
/// This check is the only thing standing between a request path and the
/// file system, so it must match the whole string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(String);

impl DateKey {
    /// Validate `key`.
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        // `\d` is Unicode-aware; restrict to ASCII so the key is always a
        // plain file name.
        if key.is_ascii() && DATE_KEY_PATTERN.is_match(key) {
            Ok(Self(key.to_string()))
        } else {
            Err(StoreError::InvalidKey {
                key: key.to_string(),
            })
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the document stored under this key.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, super::DOCUMENT_EXTENSION)
    }
}

impl FromStr for DateKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
