#![deny(unsafe_code)]

//! Reference data consumed by the flow-mapping engine.
//!
//! - [`units`]: the unit-conversion oracle and the unit-name remapping table.
//! - [`places`]: the location gazetteer and the location-suffix regex built from it.
//! - [`transformations`]: migration tables that rewrite flow fields before matching.

pub mod error;
pub mod places;
pub mod transformations;
pub mod units;

pub use crate::error::{Result, StandardsError};
pub use crate::places::{LOCATION_CODES, replace_location_suffix, split_location_suffix};
pub use crate::transformations::{MigrationFields, MigrationRecord, MigrationTable};
pub use crate::units::{Dimension, UnitDefinition, UnitLookupError, UnitRegistry, remap_unit};
