//! randonneur datapackage output.
//!
//! A datapackage bundles match exports under the `update` verb together
//! with the provenance a migration consumer needs: which flow lists were
//! mapped, by whom, and how flow fields are addressed on each side.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use flowmap_model::{Match, MatchExport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::write_text;
use crate::error::{OutputError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Contributor {
    pub fn author(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: None,
            roles: vec!["author".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub path: String,
    pub title: String,
}

impl License {
    pub fn cc_by_4() -> Self {
        Self {
            name: "CC-BY-4.0".to_string(),
            path: "https://creativecommons.org/licenses/by/4.0/".to_string(),
            title: "Creative Commons Attribution 4.0 International".to_string(),
        }
    }
}

/// How flow attributes are addressed in one flow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDescriptor {
    #[serde(rename = "expression language")]
    pub expression_language: String,
    pub labels: BTreeMap<String, String>,
}

impl Default for MappingDescriptor {
    /// Flow fields addressed by their own names.
    fn default() -> Self {
        let labels = ["name", "unit", "context", "identifier", "cas_number", "location"]
            .into_iter()
            .map(|field| (field.to_string(), field.to_string()))
            .collect();
        Self {
            expression_language: "like JSONPath".to_string(),
            labels,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source: MappingDescriptor,
    pub target: MappingDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapackage {
    pub name: String,
    pub description: String,
    pub contributors: Vec<Contributor>,
    pub created: String,
    pub version: String,
    pub licenses: Vec<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub source_id: String,
    pub target_id: String,
    pub mapping: Mapping,
    pub graph_context: Vec<String>,
    pub update: Vec<MatchExport>,
}

/// Metadata for [`build_datapackage`].
#[derive(Debug, Clone)]
pub struct RandonneurOptions {
    pub source_id: String,
    pub target_id: String,
    pub contributors: Vec<Contributor>,
    pub mapping: Mapping,
    pub version: String,
    pub licenses: Vec<License>,
    pub homepage: Option<String>,
    /// Defaults to `{source_id}-{target_id}`.
    pub name: Option<String>,
    /// Defaults to the time the package is built.
    pub created: Option<DateTime<Utc>>,
    /// Attach `flowmapper_metadata` (version, rule name) to every entry.
    pub flowmapper_metadata: bool,
}

impl RandonneurOptions {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            contributors: Vec::new(),
            mapping: Mapping::default(),
            version: "1.0.0".to_string(),
            licenses: vec![License::cc_by_4()],
            homepage: None,
            name: None,
            created: None,
            flowmapper_metadata: true,
        }
    }

    #[must_use]
    pub fn with_contributor(mut self, contributor: Contributor) -> Self {
        self.contributors.push(contributor);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    #[must_use]
    pub fn with_flowmapper_metadata(mut self, enable: bool) -> Self {
        self.flowmapper_metadata = enable;
        self
    }
}

pub fn build_datapackage(matches: &[Match], options: &RandonneurOptions) -> Datapackage {
    let created = options
        .created
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    Datapackage {
        name: options
            .name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", options.source_id, options.target_id)),
        description: format!(
            "flowmapper {} elementary flow correspondence from {} to {}",
            env!("CARGO_PKG_VERSION"),
            options.source_id,
            options.target_id
        ),
        contributors: options.contributors.clone(),
        created,
        version: options.version.clone(),
        licenses: options.licenses.clone(),
        homepage: options.homepage.clone(),
        source_id: options.source_id.clone(),
        target_id: options.target_id.clone(),
        mapping: options.mapping.clone(),
        graph_context: vec!["edges".to_string()],
        update: matches
            .iter()
            .map(|m| m.export(options.flowmapper_metadata))
            .collect(),
    }
}

pub fn write_datapackage(path: &Path, package: &Datapackage) -> Result<()> {
    let text =
        serde_json::to_string_pretty(package).map_err(|source| OutputError::json(path, source))?;
    write_text(path, &text)?;
    info!(
        path = %path.display(),
        entries = package.update.len(),
        "wrote randonneur datapackage"
    );
    Ok(())
}
