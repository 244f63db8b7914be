//! CAS registry numbers.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

static CAS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("Invalid CAS regex"));

/// A CAS number in `NNNNNNN-NN-N` form, without leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CasField(String);

impl CasField {
    /// Parses a CAS number, stripping whitespace and leading zeros.
    ///
    /// Only the format is enforced here; see [`CasField::valid`] for the
    /// check digit.
    pub fn new(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_start_matches('0');
        if !CAS_PATTERN.is_match(trimmed) {
            return Err(ModelError::InvalidCasNumber(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Permissive constructor: malformed input becomes `None`.
    pub fn from_string(value: &str) -> Option<Self> {
        Self::new(value).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check digit as written.
    pub fn check_digit(&self) -> u32 {
        self.0
            .chars()
            .last()
            .and_then(|ch| ch.to_digit(10))
            .unwrap_or_default()
    }

    /// Check digit computed from the preceding digits.
    pub fn expected_check_digit(&self) -> u32 {
        let digits: Vec<u32> = self
            .0
            .chars()
            .filter_map(|ch| ch.to_digit(10))
            .collect();
        let body = &digits[..digits.len().saturating_sub(1)];
        let sum: u32 = body
            .iter()
            .rev()
            .enumerate()
            .map(|(idx, digit)| (idx as u32 + 1) * digit)
            .sum();
        sum % 10
    }

    pub fn valid(&self) -> bool {
        self.check_digit() == self.expected_check_digit()
    }
}

impl TryFrom<String> for CasField {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CasField> for String {
    fn from(value: CasField) -> Self {
        value.0
    }
}

impl fmt::Display for CasField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
