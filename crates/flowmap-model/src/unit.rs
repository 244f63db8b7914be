//! Unit of a flow, backed by the bundled unit registry.

use std::fmt;

use flowmap_standards::{UnitRegistry, remap_unit};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::string_field::normalize_text;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitField(String);

impl UnitField {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical registry spelling of this unit.
    ///
    /// Fails when the remapped spelling is unknown to the registry.
    pub fn normalize(&self) -> Result<Self> {
        let text = normalize_text(&self.0);
        let mapped = remap_unit(&text);
        let definition = UnitRegistry::bundled()
            .resolve(mapped)
            .map_err(|_| ModelError::UnresolvedUnit {
                unit: self.0.clone(),
            })?;
        Ok(Self(definition.symbol.to_string()))
    }

    /// Factor `f` such that one of `self` equals `f` of `other`.
    ///
    /// NaN when either unit is unknown or the dimensions differ.
    pub fn conversion_factor(&self, other: &UnitField) -> f64 {
        if self.0 == other.0 {
            return 1.0;
        }
        let from = normalize_text(&self.0);
        let to = normalize_text(&other.0);
        UnitRegistry::bundled()
            .convert(remap_unit(&from), remap_unit(&to))
            .unwrap_or(f64::NAN)
    }

    pub fn compatible(&self, other: &UnitField) -> bool {
        self.conversion_factor(other).is_finite()
    }
}

impl PartialEq for UnitField {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || self.conversion_factor(other) == 1.0
    }
}

impl fmt::Display for UnitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_through_remapping() {
        assert_eq!(UnitField::new(" kilogram ").normalize().unwrap().as_str(), "kg");
        assert_eq!(UnitField::new("m2a").normalize().unwrap().as_str(), "m2*a");
        assert_eq!(
            UnitField::new("p").normalize().unwrap().as_str(),
            "dimensionless"
        );
    }

    #[test]
    fn unresolved_unit_names_the_input() {
        let err = UnitField::new("bushel").normalize().unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedUnit { ref unit } if unit == "bushel"));
    }

    #[test]
    fn conversion_factors() {
        let mg = UnitField::new("mg");
        let kg = UnitField::new("kg");
        assert_eq!(mg.conversion_factor(&kg), 1e-6);
        assert_eq!(kg.conversion_factor(&mg), 1e6);
        assert!(UnitField::new("kg").conversion_factor(&UnitField::new("m3")).is_nan());
        assert!(UnitField::new("kg").conversion_factor(&UnitField::new("bogus")).is_nan());
    }

    #[test]
    fn equality_is_unit_identity() {
        assert_eq!(UnitField::new("kg"), UnitField::new("kilogram"));
        assert_ne!(UnitField::new("kg"), UnitField::new("g"));
        assert!(UnitField::new("kWh").compatible(&UnitField::new("MJ")));
        assert!(!UnitField::new("kg").compatible(&UnitField::new("MJ")));
    }
}
