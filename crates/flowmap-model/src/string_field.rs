use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Unicode NFC composition plus trimming.
pub fn normalize_text(raw: &str) -> String {
    raw.nfc().collect::<String>().trim().to_string()
}

/// A flow name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringField(String);

impl StringField {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// NFC, trimmed, lowercased.
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self(normalize_text(&self.0).to_lowercase())
    }

    /// The value with every comma removed, for comma-insensitive comparison.
    pub fn without_commas(&self) -> String {
        self.0.replace(',', "")
    }
}

impl fmt::Display for StringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StringField {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_composition() {
        // "e" followed by a combining acute accent
        let field = StringField::new("  Cafe\u{301} Oil ");
        assert_eq!(field.normalize().as_str(), "caf\u{e9} oil");
    }

    #[test]
    fn removes_commas() {
        assert_eq!(
            StringField::new("1,4-butanediol").without_commas(),
            "14-butanediol"
        );
    }
}
