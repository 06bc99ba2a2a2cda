//! # Advisor Types
//!
//! Shared value types and wire DTOs for the tongue advisor.
//!
//! Contains:
//! - Validated newtypes (`NonEmptyText`, `DataUrl`) used at API boundaries
//! - Request/response DTOs for the REST surface (`report` module)
//!
//! Used by `advisor-core` and `api-rest` so that validation rules live in one
//! place rather than being repeated per handler.

pub mod data_url;
pub mod report;

pub use data_url::{DataUrl, DataUrlError};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is trimmed of leading and trailing
/// whitespace during construction.
///
/// The advisor's only input validation rule is "both fields present and
/// non-empty", so this type is the entire validation layer for the
/// `userFeeling` and `tongueImage` request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_trimmed_text() {
        let text = NonEmptyText::new("  咳嗽，喉咙痛  ").unwrap();
        assert_eq!(text.as_str(), "咳嗽，喉咙痛");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new("   \n\t"), Err(TextError::Empty)));
    }

    #[test]
    fn serde_round_trip() {
        let text = NonEmptyText::new("头晕").unwrap();
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, "\"头晕\"");
        let back: NonEmptyText = serde_json::from_str(&json).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
