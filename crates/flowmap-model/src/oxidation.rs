//! Oxidation states parsed from flow names.
//!
//! Names such as `"Chromium VI"`, `"Iron(II)"` or `"Iron, -3"` carry the
//! oxidation state as a suffix. Extraction returns the state and the name
//! without it.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const MIN_STATE: i64 = -5;
const MAX_STATE: i64 = 9;

static ROMAN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:,?\s+\(?\s*(?P<numeral>[IVX]+)\s*(?P<sign>[+\-−]*)\s*\)?|\(\s*(?P<pnumeral>[IVX]+)\s*(?P<psign>[+\-−]*)\s*\))\s*$",
    )
    .expect("Invalid roman oxidation state regex")
});

static NUMBER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:,?\s+\(?\s*|\(\s*)(?P<sign>[+\-−]+)?(?P<number>\d{1,3})(?P<sign2>[+\-−]+)?\s*\)?\s*$",
    )
    .expect("Invalid numeric oxidation state regex")
});

static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^X{0,3}(IX|IV|V?I{0,3})$").expect("Invalid roman numeral regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OxidationState(i8);

impl OxidationState {
    pub fn new(value: i64) -> Result<Self> {
        if !(MIN_STATE..=MAX_STATE).contains(&value) {
            return Err(ModelError::OxidationStateOutOfBounds { value });
        }
        Ok(Self(value as i8))
    }

    pub fn value(self) -> i8 {
        self.0
    }

    pub fn has_oxidation_state(name: &str) -> bool {
        ROMAN_SUFFIX.is_match(name) || NUMBER_SUFFIX.is_match(name)
    }

    /// Splits an oxidation-state suffix off `name`.
    ///
    /// `Ok(None)` when the name carries no suffix; an error when it carries
    /// one that is not a valid roman numeral or is out of bounds.
    pub fn from_name(name: &str) -> Result<Option<(Self, String)>> {
        if let Some(captures) = ROMAN_SUFFIX.captures(name) {
            let (numeral, sign) = match captures.name("numeral") {
                Some(numeral) => (numeral.as_str(), captures.name("sign")),
                None => (
                    captures.name("pnumeral").map_or("", |m| m.as_str()),
                    captures.name("psign"),
                ),
            };
            let magnitude = roman_to_int(numeral)?;
            let value = signed(magnitude, sign.map(|m| m.as_str()));
            return Ok(Some((Self::new(value)?, stripped(name, &captures))));
        }
        if let Some(captures) = NUMBER_SUFFIX.captures(name) {
            let magnitude: i64 = captures
                .name("number")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default();
            let sign = [captures.name("sign"), captures.name("sign2")]
                .into_iter()
                .flatten()
                .map(|m| m.as_str())
                .collect::<String>();
            let value = signed(magnitude, Some(sign.as_str()));
            return Ok(Some((Self::new(value)?, stripped(name, &captures))));
        }
        Ok(None)
    }
}

fn signed(magnitude: i64, sign: Option<&str>) -> i64 {
    match sign {
        Some(sign) if sign.contains(['-', '−']) => -magnitude,
        _ => magnitude,
    }
}

fn stripped(name: &str, captures: &Captures<'_>) -> String {
    let start = captures.get(0).map_or(name.len(), |m| m.start());
    name[..start].trim_end().to_string()
}

fn roman_to_int(numeral: &str) -> Result<i64> {
    let upper = numeral.to_uppercase();
    if upper.is_empty() || !ROMAN_NUMERAL.is_match(&upper) {
        return Err(ModelError::InvalidRomanNumeral(numeral.to_string()));
    }
    let values: Vec<i64> = upper
        .chars()
        .map(|ch| match ch {
            'I' => 1,
            'V' => 5,
            _ => 10,
        })
        .collect();
    let mut total = 0;
    for (idx, value) in values.iter().enumerate() {
        if values.get(idx + 1).is_some_and(|next| next > value) {
            total -= value;
        } else {
            total += value;
        }
    }
    Ok(total)
}

impl TryFrom<i64> for OxidationState {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OxidationState> for i64 {
    fn from(value: OxidationState) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for OxidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> Option<(i8, String)> {
        OxidationState::from_name(name)
            .unwrap()
            .map(|(state, rest)| (state.value(), rest))
    }

    #[test]
    fn roman_suffixes() {
        assert_eq!(parse("Iron(II)"), Some((2, "Iron".to_string())));
        assert_eq!(parse("Chromium VI"), Some((6, "Chromium".to_string())));
        assert_eq!(parse("Chromium, (III)"), Some((3, "Chromium".to_string())));
        assert_eq!(parse("chromium iv"), Some((4, "chromium".to_string())));
        assert_eq!(parse("Iron (II-)"), Some((-2, "Iron".to_string())));
    }

    #[test]
    fn numeric_suffixes() {
        assert_eq!(parse("iron −3"), Some((-3, "iron".to_string())));
        assert_eq!(parse("Iron, +3"), Some((3, "Iron".to_string())));
        assert_eq!(parse("Manganese (2+)"), Some((2, "Manganese".to_string())));
    }

    #[test]
    fn names_without_suffix() {
        assert_eq!(parse("Carbon dioxide, fossil"), None);
        assert_eq!(parse("Carbon-14"), None);
        assert_eq!(parse("Propane, 1,2-"), None);
        assert!(!OxidationState::has_oxidation_state("Methane"));
    }

    #[test]
    fn rejects_out_of_bounds() {
        assert!(matches!(
            OxidationState::from_name("Iron, 12"),
            Err(ModelError::OxidationStateOutOfBounds { value: 12 })
        ));
        assert!(OxidationState::new(-6).is_err());
        assert!(OxidationState::new(9).is_ok());
    }

    #[test]
    fn rejects_invalid_numerals() {
        assert!(matches!(
            OxidationState::from_name("Iron IIII"),
            Err(ModelError::InvalidRomanNumeral(_))
        ));
    }
}
