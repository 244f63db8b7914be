//! Migration tables.
//!
//! A migration table rewrites flow fields (name, context, unit, location)
//! from one nomenclature to another before matching. Two JSON layouts are
//! accepted:
//!
//! ```text
//! [ {"source": {...}, "target": {...}, "conversion_factor": 1.0}, ... ]
//!
//! { "name": "...", "case-insensitive": true,
//!   "update": [ {"source": {...}, "target": {...}}, ... ] }
//! ```
//!
//! The second form is the `update` section of a randonneur datapackage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StandardsError};

/// Partial set of flow fields, used both to select and to rewrite flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// String path (`"air/urban"`) or list of segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl MigrationFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit.is_none()
            && self.context.is_none()
            && self.location.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub source: MigrationFields,
    #[serde(default)]
    pub target: MigrationFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationTable {
    pub name: String,
    /// Compare names without regard to case when selecting records.
    pub case_insensitive: bool,
    pub records: Vec<MigrationRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableLayout {
    Records(Vec<MigrationRecord>),
    Package {
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "case-insensitive")]
        case_insensitive: bool,
        update: Vec<MigrationRecord>,
    },
}

impl MigrationTable {
    pub fn new(name: impl Into<String>, records: Vec<MigrationRecord>) -> Self {
        Self {
            name: name.into(),
            case_insensitive: false,
            records,
        }
    }

    #[must_use]
    pub fn with_case_insensitive(mut self, enable: bool) -> Self {
        self.case_insensitive = enable;
        self
    }

    /// Parses a table from JSON text; `fallback_name` names bare record lists.
    pub fn from_json_str(text: &str, fallback_name: &str) -> serde_json::Result<Self> {
        let table = match serde_json::from_str::<TableLayout>(text)? {
            TableLayout::Records(records) => Self::new(fallback_name, records),
            TableLayout::Package {
                name,
                case_insensitive,
                update,
            } => Self::new(name.unwrap_or_else(|| fallback_name.to_string()), update)
                .with_case_insensitive(case_insensitive),
        };
        Ok(table)
    }

    /// Loads a table from disk, rejecting records with an empty source selector.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| StandardsError::io(path, source))?;
        let fallback = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let table = Self::from_json_str(&text, &fallback).map_err(|source| StandardsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        table.validate()?;
        debug!(
            table = %table.name,
            records = table.records.len(),
            "loaded migration table"
        );
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(idx) = self.records.iter().position(|r| r.source.is_empty()) {
            return Err(StandardsError::InvalidMigrationTable {
                name: self.name.clone(),
                message: format!("record {idx} has an empty source selector"),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_record_list() {
        let table = MigrationTable::from_json_str(
            r#"[{"source": {"name": "Carbon dioxide"},
                 "target": {"name": "Carbon dioxide, fossil"}}]"#,
            "co2",
        )
        .unwrap();
        assert_eq!(table.name, "co2");
        assert!(!table.case_insensitive);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.records[0].target.name.as_deref(),
            Some("Carbon dioxide, fossil")
        );
    }

    #[test]
    fn parses_package_layout() {
        let table = MigrationTable::from_json_str(
            r#"{"name": "simapro", "case-insensitive": true, "update": [
                {"source": {"name": "Water", "context": ["air"]},
                 "target": {"name": "Water vapour"},
                 "conversion_factor": 0.5}
            ]}"#,
            "fallback",
        )
        .unwrap();
        assert_eq!(table.name, "simapro");
        assert!(table.case_insensitive);
        assert_eq!(table.records[0].conversion_factor, Some(0.5));
    }

    #[test]
    fn rejects_empty_selector() {
        let table = MigrationTable::new(
            "broken",
            vec![MigrationRecord {
                source: MigrationFields::default(),
                target: MigrationFields::default(),
                conversion_factor: None,
            }],
        );
        assert!(matches!(
            table.validate(),
            Err(StandardsError::InvalidMigrationTable { .. })
        ));
    }
}
