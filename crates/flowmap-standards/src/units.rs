//! Unit-conversion oracle.
//!
//! Every unit is a scale factor relative to an SI-coherent base plus a
//! dimension vector. Two units convert into each other only when their
//! dimensions are identical; the factor is the ratio of their scales.
//!
//! Compound units used in LCA inventories (land occupation `m2*a`,
//! transport `t*km`, ...) are listed as first-class definitions rather than
//! parsed, since inventories only ever use a small closed set of them.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Exponents of the base quantities a unit is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub amount: i8,
}

const fn dim(mass: i8, length: i8, time: i8, amount: i8) -> Dimension {
    Dimension {
        mass,
        length,
        time,
        amount,
    }
}

const DIMENSIONLESS: Dimension = dim(0, 0, 0, 0);
const MASS: Dimension = dim(1, 0, 0, 0);
const LENGTH: Dimension = dim(0, 1, 0, 0);
const AREA: Dimension = dim(0, 2, 0, 0);
const VOLUME: Dimension = dim(0, 3, 0, 0);
const TIME: Dimension = dim(0, 0, 1, 0);
const ENERGY: Dimension = dim(1, 2, -2, 0);
const POWER: Dimension = dim(1, 2, -3, 0);
const ACTIVITY: Dimension = dim(0, 0, -1, 0);
const AMOUNT: Dimension = dim(0, 0, 0, 1);
const LENGTH_TIME: Dimension = dim(0, 1, 1, 0);
const AREA_TIME: Dimension = dim(0, 2, 1, 0);
const VOLUME_TIME: Dimension = dim(0, 3, 1, 0);
const MASS_LENGTH: Dimension = dim(1, 1, 0, 0);
const MASS_TIME: Dimension = dim(1, 0, 1, 0);

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
/// Julian year, as used by ecoinvent for occupation flows.
const YEAR: f64 = 31_557_600.0;

/// A single entry of the unit table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    /// Canonical symbol (what normalized flows carry).
    pub symbol: &'static str,
    /// Other spellings that resolve to this unit.
    pub aliases: &'static [&'static str],
    pub dimension: Dimension,
    /// Multiplier to the SI-coherent base of `dimension`.
    pub scale: f64,
}

const fn unit(
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    scale: f64,
) -> UnitDefinition {
    UnitDefinition {
        symbol,
        aliases,
        dimension,
        scale,
    }
}

static DEFINITIONS: &[UnitDefinition] = &[
    unit("dimensionless", &["dimensionless"], DIMENSIONLESS, 1.0),
    // mass
    unit("kg", &["kilogram", "kilograms"], MASS, 1.0),
    unit("g", &["gram", "grams"], MASS, 1e-3),
    unit("mg", &["milligram", "milligrams"], MASS, 1e-6),
    unit("ug", &["µg", "microgram", "micrograms"], MASS, 1e-9),
    unit("ng", &["nanogram", "nanograms"], MASS, 1e-12),
    unit("t", &["tonne", "tonnes", "metric_ton", "ton"], MASS, 1e3),
    unit("kt", &["kilotonne", "kilotonnes"], MASS, 1e6),
    unit("Mt", &["megatonne", "megatonnes"], MASS, 1e9),
    unit("lb", &["pound", "pounds"], MASS, 0.453_592_37),
    unit("oz", &["ounce", "ounces"], MASS, 0.028_349_523_125),
    // length
    unit("m", &["meter", "metre", "meters", "metres"], LENGTH, 1.0),
    unit("km", &["kilometer", "kilometre", "kilometers", "kilometres"], LENGTH, 1e3),
    unit("cm", &["centimeter", "centimetre"], LENGTH, 1e-2),
    unit("mm", &["millimeter", "millimetre"], LENGTH, 1e-3),
    unit("mi", &["mile", "miles"], LENGTH, 1_609.344),
    unit("ft", &["foot", "feet"], LENGTH, 0.3048),
    // area
    unit("m2", &["square_meter", "square meter", "square metre"], AREA, 1.0),
    unit("km2", &["square_kilometer", "square kilometer"], AREA, 1e6),
    unit("ha", &["hectare", "hectares"], AREA, 1e4),
    unit("cm2", &["square_centimeter"], AREA, 1e-4),
    unit("ft2", &["square_foot", "square feet"], AREA, 0.092_903_04),
    // volume
    unit("m3", &["cubic_meter", "cubic meter", "cubic metre"], VOLUME, 1.0),
    unit("dm3", &["cubic_decimeter"], VOLUME, 1e-3),
    unit("cm3", &["cubic_centimeter"], VOLUME, 1e-6),
    unit("l", &["L", "liter", "litre", "liters", "litres"], VOLUME, 1e-3),
    unit("ml", &["mL", "milliliter", "millilitre"], VOLUME, 1e-6),
    unit("ft3", &["cubic_foot", "cubic feet"], VOLUME, 0.028_316_846_592),
    unit("gal", &["gallon", "us_gallon"], VOLUME, 0.003_785_411_784),
    // time
    unit("s", &["second", "seconds"], TIME, 1.0),
    unit("min", &["minute", "minutes"], TIME, MINUTE),
    unit("h", &["hour", "hours", "hr"], TIME, HOUR),
    unit("d", &["day", "days"], TIME, DAY),
    unit("a", &["year", "years", "yr"], TIME, YEAR),
    // energy
    unit("J", &["joule", "joules"], ENERGY, 1.0),
    unit("kJ", &["kilojoule", "kilojoules"], ENERGY, 1e3),
    unit("MJ", &["megajoule", "megajoules"], ENERGY, 1e6),
    unit("GJ", &["gigajoule", "gigajoules"], ENERGY, 1e9),
    unit("TJ", &["terajoule", "terajoules"], ENERGY, 1e12),
    unit("Wh", &["watt_hour", "watt hour"], ENERGY, HOUR),
    unit("kWh", &["kilowatt_hour", "kilowatt hour"], ENERGY, 1e3 * HOUR),
    unit("MWh", &["megawatt_hour", "megawatt hour"], ENERGY, 1e6 * HOUR),
    unit("GWh", &["gigawatt_hour", "gigawatt hour"], ENERGY, 1e9 * HOUR),
    unit("kcal", &["kilocalorie", "kilocalories"], ENERGY, 4_184.0),
    unit("Btu", &["btu", "british_thermal_unit"], ENERGY, 1_055.055_852_62),
    // power
    unit("W", &["watt", "watts"], POWER, 1.0),
    unit("kW", &["kilowatt", "kilowatts"], POWER, 1e3),
    unit("MW", &["megawatt", "megawatts"], POWER, 1e6),
    // radioactivity
    unit("Bq", &["becquerel", "becquerels"], ACTIVITY, 1.0),
    unit("kBq", &["kilobecquerel", "kilobecquerels"], ACTIVITY, 1e3),
    unit("MBq", &["megabecquerel", "megabecquerels"], ACTIVITY, 1e6),
    unit("GBq", &["gigabecquerel", "gigabecquerels"], ACTIVITY, 1e9),
    // amount of substance
    unit("mol", &["mole", "moles"], AMOUNT, 1.0),
    unit("kmol", &["kilomole", "kilomoles"], AMOUNT, 1e3),
    // occupation and transformation
    unit("m*a", &["meter_year", "meter-year"], LENGTH_TIME, YEAR),
    unit("m2*a", &["square_meter_year", "square meter-year"], AREA_TIME, YEAR),
    unit("ha*a", &["hectare_year", "hectare-year"], AREA_TIME, 1e4 * YEAR),
    unit("km2*a", &["square_kilometer_year"], AREA_TIME, 1e6 * YEAR),
    unit("m3*a", &["cubic_meter_year", "cubic meter-year"], VOLUME_TIME, YEAR),
    // transport
    unit("t*km", &["tonne_kilometer", "ton kilometer"], MASS_LENGTH, 1e6),
    unit("kg*km", &["kilogram_kilometer"], MASS_LENGTH, 1e3),
    unit("person*km", &["person_kilometer", "passenger_kilometer"], LENGTH, 1e3),
    unit("kg*d", &["kilogram_day", "kg*day"], MASS_TIME, DAY),
];

/// Source spellings remapped onto a name the registry resolves.
///
/// Applied after NFC normalization and trimming, before registry lookup.
static UNIT_MAPPING: &[(&str, &str)] = &[
    ("p", "dimensionless"),
    ("unit", "dimensionless"),
    ("units", "dimensionless"),
    ("item", "dimensionless"),
    ("items", "dimensionless"),
    ("Item(s)", "dimensionless"),
    ("piece", "dimensionless"),
    ("pieces", "dimensionless"),
    ("KG", "kg"),
    ("Kg", "kg"),
    ("kwh", "kWh"),
    ("KWH", "kWh"),
    ("kilowatt-hour", "kWh"),
    ("Nm3", "m3"),
    ("Sm3", "m3"),
    ("standard cubic meter", "m3"),
    ("m^3", "m3"),
    ("m^2", "m2"),
    ("m2a", "m2*a"),
    ("m2.a", "m2*a"),
    ("m2 a", "m2*a"),
    ("m2*year", "m2*a"),
    ("m2y", "m2*a"),
    ("m3a", "m3*a"),
    ("m3.a", "m3*a"),
    ("m3*year", "m3*a"),
    ("m3y", "m3*a"),
    ("ma", "m*a"),
    ("m.a", "m*a"),
    ("m*year", "m*a"),
    ("my", "m*a"),
    ("haa", "ha*a"),
    ("ha a", "ha*a"),
    ("tkm", "t*km"),
    ("t.km", "t*km"),
    ("kgkm", "kg*km"),
    ("pkm", "person*km"),
    ("personkm", "person*km"),
    ("kg day", "kg*d"),
    ("kgday", "kg*d"),
    ("kg*day", "kg*d"),
    ("lbs", "lb"),
];

/// Maps a source unit spelling onto the name used for registry lookup.
///
/// Unknown spellings pass through unchanged.
pub fn remap_unit(unit: &str) -> &str {
    UNIT_MAPPING
        .iter()
        .find(|(source, _)| *source == unit)
        .map_or(unit, |(_, target)| *target)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitLookupError {
    #[error("unit '{unit}' is not defined")]
    NotFound { unit: String },
    #[error("cannot convert '{from}' to '{to}': incompatible dimensions")]
    Incompatible { from: String, to: String },
}

/// Lookup table over the bundled unit definitions.
#[derive(Debug)]
pub struct UnitRegistry {
    definitions: &'static [UnitDefinition],
    exact: HashMap<&'static str, usize>,
    folded: HashMap<String, usize>,
}

static BUNDLED: LazyLock<UnitRegistry> = LazyLock::new(|| UnitRegistry::new(DEFINITIONS));

impl UnitRegistry {
    fn new(definitions: &'static [UnitDefinition]) -> Self {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        for (idx, definition) in definitions.iter().enumerate() {
            exact.insert(definition.symbol, idx);
            for alias in definition.aliases {
                exact.entry(*alias).or_insert(idx);
                folded.entry(alias.to_lowercase()).or_insert(idx);
            }
        }
        Self {
            definitions,
            exact,
            folded,
        }
    }

    /// The registry built from the bundled unit table.
    pub fn bundled() -> &'static UnitRegistry {
        &BUNDLED
    }

    /// Resolves a unit by symbol or alias.
    ///
    /// Symbols are case-sensitive (`MJ` is not `mJ`); alias names also
    /// match case-insensitively.
    pub fn resolve(&self, unit: &str) -> Result<&UnitDefinition, UnitLookupError> {
        let idx = self
            .exact
            .get(unit)
            .or_else(|| self.folded.get(&unit.to_lowercase()))
            .ok_or_else(|| UnitLookupError::NotFound {
                unit: unit.to_string(),
            })?;
        Ok(&self.definitions[*idx])
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.resolve(unit).is_ok()
    }

    /// Factor `f` such that `1 from == f to`.
    pub fn convert(&self, from: &str, to: &str) -> Result<f64, UnitLookupError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if source.dimension != target.dimension {
            return Err(UnitLookupError::Incompatible {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(round_significant(source.scale / target.scale))
    }

    pub fn definitions(&self) -> &[UnitDefinition] {
        self.definitions
    }
}

/// Rounds to 15 significant digits, dropping the representation error of
/// decimal scales (`1.0 / 1e-6` is not exactly `1e6` in binary).
fn round_significant(value: f64) -> f64 {
    format!("{value:.14e}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_symbols_and_aliases() {
        let registry = UnitRegistry::bundled();
        assert_eq!(registry.resolve("kg").unwrap().symbol, "kg");
        assert_eq!(registry.resolve("Kilogram").unwrap().symbol, "kg");
        assert_eq!(registry.resolve("cubic meter").unwrap().symbol, "m3");
        assert!(registry.resolve("furlong").is_err());
    }

    #[test]
    fn symbols_are_case_sensitive() {
        let registry = UnitRegistry::bundled();
        assert_eq!(registry.resolve("MJ").unwrap().symbol, "MJ");
        assert!(registry.resolve("mj").is_err());
    }

    #[test]
    fn converts_mass() {
        let registry = UnitRegistry::bundled();
        assert_eq!(registry.convert("mg", "kg").unwrap(), 1e-6);
        assert_eq!(registry.convert("kg", "mg").unwrap(), 1e6);
        assert_eq!(registry.convert("kg", "kg").unwrap(), 1.0);
    }

    #[test]
    fn converts_energy() {
        let registry = UnitRegistry::bundled();
        let factor = registry.convert("kWh", "MJ").unwrap();
        assert!((factor - 3.6).abs() < 1e-12);
    }

    #[test]
    fn distinguishes_lookup_errors() {
        let registry = UnitRegistry::bundled();
        assert!(matches!(
            registry.convert("kg", "m3"),
            Err(UnitLookupError::Incompatible { .. })
        ));
        assert!(matches!(
            registry.convert("kg", "bogus"),
            Err(UnitLookupError::NotFound { .. })
        ));
    }

    #[test]
    fn remaps_source_spellings() {
        assert_eq!(remap_unit("m2a"), "m2*a");
        assert_eq!(remap_unit("p"), "dimensionless");
        assert_eq!(remap_unit("kg"), "kg");
        assert!(UnitRegistry::bundled().contains(remap_unit("tkm")));
    }

    #[test]
    fn every_mapping_target_resolves() {
        let registry = UnitRegistry::bundled();
        for (source, target) in UNIT_MAPPING {
            assert!(registry.contains(target), "{source} -> {target}");
        }
    }
}
