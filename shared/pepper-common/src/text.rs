//! Locale-keyed text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::locale::LocaleCode;

/// A mapping from locale code to a translated string.
///
/// Serializes as a plain JSON object (`{"en": "...", "vi": "..."}`), which is
/// also how it is stored in JSONB columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<LocaleCode, String>);

impl LocalizedText {
    /// An empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the translation for `locale`.
    pub fn set(&mut self, locale: LocaleCode, value: impl Into<String>) {
        self.0.insert(locale, value.into());
    }

    /// The translation for exactly `locale`, if present.
    #[must_use]
    pub fn get(&self, locale: &LocaleCode) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// The translation for `locale`, falling back to `fallback`, falling
    /// back to any translation at all.
    #[must_use]
    pub fn resolve(&self, locale: &LocaleCode, fallback: &LocaleCode) -> Option<&str> {
        self.get(locale)
            .or_else(|| self.get(fallback))
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    /// Whether no translation is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of translations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every present translation is non-blank. Empty strings are
    /// treated as data errors, not as "no translation".
    #[must_use]
    pub fn values_non_blank(&self) -> bool {
        self.0.values().all(|v| !v.trim().is_empty())
    }

    /// Iterate over `(locale, text)` pairs in locale order.
    pub fn iter(&self) -> impl Iterator<Item = (&LocaleCode, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl FromIterator<(LocaleCode, String)> for LocalizedText {
    fn from_iter<I: IntoIterator<Item = (LocaleCode, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LocaleCode {
        LocaleCode::new("en").unwrap()
    }

    fn vi() -> LocaleCode {
        LocaleCode::new("vi").unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let mut text = LocalizedText::new();
        text.set(en(), "Hello");

        assert_eq!(text.get(&en()), Some("Hello"));
        assert_eq!(text.get(&vi()), None);
    }

    #[test]
    fn test_resolve_prefers_exact_then_fallback_then_any() {
        let mut text = LocalizedText::new();
        text.set(vi(), "Xin chào");

        // Exact miss, fallback miss, any hit.
        let de = LocaleCode::new("de").unwrap();
        assert_eq!(text.resolve(&de, &en()), Some("Xin chào"));

        text.set(en(), "Hello");
        assert_eq!(text.resolve(&de, &en()), Some("Hello"));
        assert_eq!(text.resolve(&vi(), &en()), Some("Xin chào"));
    }

    #[test]
    fn test_blank_values_detected() {
        let mut text = LocalizedText::new();
        text.set(en(), "ok");
        assert!(text.values_non_blank());

        text.set(vi(), "   ");
        assert!(!text.values_non_blank());
    }

    #[test]
    fn test_serde_is_a_plain_object() {
        let mut text = LocalizedText::new();
        text.set(en(), "Hello");
        text.set(vi(), "Xin chào");

        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"en": "Hello", "vi": "Xin chào"})
        );

        let back: LocalizedText = serde_json::from_value(json).unwrap();
        assert_eq!(back, text);
    }
}
