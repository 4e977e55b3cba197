//! Locale codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for malformed locale codes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleError {
    /// Code is empty or has the wrong shape.
    #[error("Invalid locale code: {0}")]
    Invalid(String),
}

/// A validated, lowercase locale code (`en`, `vi`, `pt-br`, ...).
///
/// Shape: a 2-3 letter language tag, optionally followed by `-` and a 2-8
/// character alphanumeric region/script subtag. Input is lowercased before
/// validation so `"pt-BR"` and `"pt-br"` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleCode(String);

impl LocaleCode {
    /// Validate and normalize a locale code.
    pub fn new(code: &str) -> Result<Self, LocaleError> {
        let normalized = code.trim().to_ascii_lowercase();

        let mut parts = normalized.split('-');
        let language = parts.next().unwrap_or_default();
        let subtag = parts.next();

        let language_ok = (2..=3).contains(&language.len())
            && language.chars().all(|c| c.is_ascii_lowercase());
        let subtag_ok = subtag.is_none_or(|s| {
            (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
        });

        // At most one "-" separator.
        if language_ok && subtag_ok && parts.next().is_none() {
            Ok(Self(normalized))
        } else {
            Err(LocaleError::Invalid(code.to_string()))
        }
    }

    /// The normalized code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocaleCode {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LocaleCode> for String {
    fn from(code: LocaleCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_codes() {
        assert_eq!(LocaleCode::new("en").unwrap().as_str(), "en");
        assert_eq!(LocaleCode::new("vi").unwrap().as_str(), "vi");
        assert_eq!(LocaleCode::new("fil").unwrap().as_str(), "fil");
    }

    #[test]
    fn test_region_codes_normalize_to_lowercase() {
        assert_eq!(LocaleCode::new("pt-BR").unwrap().as_str(), "pt-br");
        assert_eq!(LocaleCode::new("zh-hant").unwrap().as_str(), "zh-hant");
    }

    #[test]
    fn test_invalid_codes_rejected() {
        for bad in ["", "e", "english", "en_US", "en-", "-br", "en-us-x1", "12"] {
            assert!(LocaleCode::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let code: LocaleCode = serde_json::from_str("\"pt-BR\"").unwrap();
        assert_eq!(code.as_str(), "pt-br");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"pt-br\"");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<LocaleCode>("\"not a locale\"").is_err());
    }
}
