//! Data URL parsing.
//!
//! The captured tongue photo travels and rests as a base64 data URL
//! (`data:image/jpeg;base64,...`). This module provides a validated wrapper so
//! that code which needs the media type or the raw payload does not re-parse
//! the string ad hoc.

/// Errors that can occur when parsing a data URL.
#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    /// The string does not start with the `data:` scheme
    #[error("not a data URL (missing 'data:' scheme)")]
    MissingScheme,
    /// The string has no `;base64,` separator between media type and payload
    #[error("data URL is not base64-encoded")]
    NotBase64,
    /// The base64 payload section is empty
    #[error("data URL has an empty payload")]
    EmptyPayload,
}

/// A validated `data:<media-type>;base64,<payload>` string.
///
/// Only the outer structure is validated here; the payload is not base64
/// decoded until something actually needs the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    const SCHEME: &'static str = "data:";
    const SEPARATOR: &'static str = ";base64,";

    /// Parses and validates the outer structure of a data URL.
    pub fn parse(input: impl Into<String>) -> Result<Self, DataUrlError> {
        let input = input.into();
        {
            let rest = input
                .strip_prefix(Self::SCHEME)
                .ok_or(DataUrlError::MissingScheme)?;
            let (_, payload) = rest
                .split_once(Self::SEPARATOR)
                .ok_or(DataUrlError::NotBase64)?;
            if payload.is_empty() {
                return Err(DataUrlError::EmptyPayload);
            }
        }
        Ok(Self(input))
    }

    /// Builds a data URL from a media type and an already base64-encoded
    /// payload.
    pub fn from_base64(media_type: &str, payload: &str) -> Result<Self, DataUrlError> {
        if payload.is_empty() {
            return Err(DataUrlError::EmptyPayload);
        }
        Ok(Self(format!(
            "{}{}{}{}",
            Self::SCHEME,
            media_type,
            Self::SEPARATOR,
            payload
        )))
    }

    /// The declared media type, e.g. `image/jpeg`.
    pub fn media_type(&self) -> &str {
        let rest = &self.0[Self::SCHEME.len()..];
        rest.split_once(Self::SEPARATOR)
            .map(|(mime, _)| mime)
            .unwrap_or("")
    }

    /// The base64 payload section, without the scheme or media type.
    pub fn payload_base64(&self) -> &str {
        let rest = &self.0[Self::SCHEME.len()..];
        rest.split_once(Self::SEPARATOR)
            .map(|(_, payload)| payload)
            .unwrap_or("")
    }

    /// The full data URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the full string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DataUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
