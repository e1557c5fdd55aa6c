//! Date key validation
//!
//! A date key is an opaque grouping string (usually `YYYY-MM-DD`). The
//! service never parses it as a date; it only has to be non-empty and short.

use super::ValidationError;

/// Maximum length for date keys
const MAX_DATE_KEY_LEN: usize = 64;

/// Validated booking group key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(String);

impl DateKey {
    /// Create a new date key.
    ///
    /// # Rules
    /// - Not empty or whitespace only
    /// - Max 64 characters
    ///
    /// # Example
    /// ```
    /// use jobbook_server::models::DateKey;
    ///
    /// assert!(DateKey::new("2024-05-01").is_ok());
    /// assert!(DateKey::new("  ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "date_key" });
        }

        if s.chars().count() > MAX_DATE_KEY_LEN {
            return Err(ValidationError::TooLong {
                field: "date_key",
                max: MAX_DATE_KEY_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for DateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
