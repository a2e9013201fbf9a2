//! Delivery postcodes.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostcodeError {
    #[error("postcode cannot be empty")]
    Empty,
    #[error("postcode must be at most {max} characters")]
    TooLong { max: usize },
}

/// A postcode normalized for lookup: surrounding whitespace trimmed and
/// letters uppercased. Inner spacing is kept as entered, so `"sw1a 1aa"` and
/// `"SW1A 1AA"` are the same key but `"SW1A1AA"` is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Postcode(String);

impl Postcode {
    pub const MAX_LENGTH: usize = 16;

    /// # Errors
    ///
    /// Returns `PostcodeError` for blank or oversized input.
    pub fn parse(raw: &str) -> Result<Self, PostcodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PostcodeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(PostcodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize a search prefix the same way postcodes are stored.
///
/// Unlike [`Postcode::parse`] an empty prefix is allowed.
#[must_use]
pub fn normalize_prefix(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Postcode {
    type Error = PostcodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Postcode> for String {
    fn from(postcode: Postcode) -> Self {
        postcode.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_uppercases() {
        assert_eq!(Postcode::parse("  sw1a 1aa ").unwrap().as_str(), "SW1A 1AA");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Postcode::parse("   "), Err(PostcodeError::Empty));
    }

    #[test]
    fn test_parse_rejects_oversized() {
        assert!(matches!(
            Postcode::parse("ABCDEFGHIJKLMNOPQ"),
            Err(PostcodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(" ec1 "), "EC1");
        assert_eq!(normalize_prefix(""), "");
    }
}
