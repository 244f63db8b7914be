//! Elementary flows.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use flowmap_standards::{replace_location_suffix, split_location_suffix};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::cas::CasField;
use crate::context::ContextField;
use crate::error::{ModelError, Result};
use crate::ids::{FlowId, FlowIdAllocator};
use crate::oxidation::OxidationState;
use crate::string_field::StringField;
use crate::unit::UnitField;

static UNIT_SLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?P<unit>m3|kg)(,?\s+|\s+|$)").expect("Invalid unit slash regex")
});

/// Flat flow record as found in flow-list JSON files.
///
/// `name`, `unit` and `context` are required; they are optional here so a
/// missing key reports [`ModelError::MissingField`] instead of a serde error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxidation_state: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
}

impl FlowRecord {
    pub fn new(name: &str, unit: &str, context: impl Into<Value>) -> Self {
        Self {
            name: Some(name.to_string()),
            unit: Some(unit.to_string()),
            context: Some(context.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    #[must_use]
    pub fn with_cas_number(mut self, cas_number: &str) -> Self {
        self.cas_number = Some(cas_number.to_string());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

/// Partial field overrides applied on top of a normalized flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowUpdate {
    pub name: Option<StringField>,
    pub unit: Option<UnitField>,
    pub context: Option<ContextField>,
    pub location: Option<String>,
    pub oxidation_state: Option<OxidationState>,
    pub conversion_factor: Option<f64>,
}

impl FlowUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `other` wins wherever it sets a field.
    #[must_use]
    pub fn merge(&self, other: &FlowUpdate) -> FlowUpdate {
        FlowUpdate {
            name: other.name.clone().or_else(|| self.name.clone()),
            unit: other.unit.clone().or_else(|| self.unit.clone()),
            context: other.context.clone().or_else(|| self.context.clone()),
            location: other.location.clone().or_else(|| self.location.clone()),
            oxidation_state: other.oxidation_state.or(self.oxidation_state),
            conversion_factor: other.conversion_factor.or(self.conversion_factor),
        }
    }
}

/// An elementary flow.
///
/// Equality, hashing and ordering use the flow's [`FlowId`], never its
/// content: two flows built from identical records are different flows.
#[derive(Debug, Clone)]
pub struct Flow {
    id: FlowId,
    pub name: StringField,
    pub unit: UnitField,
    pub context: ContextField,
    pub identifier: Option<String>,
    pub location: Option<String>,
    pub oxidation_state: Option<OxidationState>,
    pub cas_number: Option<CasField>,
    pub synonyms: Vec<String>,
    /// Extra multiplicative factor supplied by upstream transformation data.
    pub conversion_factor: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Flow {
    pub fn from_record(record: FlowRecord, ids: &FlowIdAllocator) -> Result<Self> {
        let name = record.name.ok_or(ModelError::MissingField("name"))?;
        let unit = record.unit.ok_or(ModelError::MissingField("unit"))?;
        let context = record.context.ok_or(ModelError::MissingField("context"))?;
        let cas_number = non_empty(record.cas_number)
            .map(|cas| CasField::new(&cas))
            .transpose()?;
        let oxidation_state = record
            .oxidation_state
            .map(OxidationState::new)
            .transpose()?;
        Ok(Self {
            id: ids.next_id(),
            name: StringField::new(name),
            unit: UnitField::new(unit),
            context: ContextField::from_json(&context)?,
            identifier: non_empty(record.identifier),
            location: non_empty(record.location),
            oxidation_state,
            cas_number,
            synonyms: record.synonyms,
            conversion_factor: record.conversion_factor,
        })
    }

    pub fn to_record(&self) -> FlowRecord {
        FlowRecord {
            name: Some(self.name.to_string()),
            unit: Some(self.unit.to_string()),
            context: serde_json::to_value(&self.context).ok(),
            identifier: self.identifier.clone(),
            location: self.location.clone(),
            oxidation_state: self.oxidation_state.map(i64::from),
            cas_number: self.cas_number.as_ref().map(ToString::to_string),
            synonyms: self.synonyms.clone(),
            conversion_factor: self.conversion_factor,
        }
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    /// Canonical form of this flow, as a new flow.
    ///
    /// Unit suffixes (`/kg`, `/m3`) are dropped from the name, then a
    /// location suffix and an oxidation-state suffix are moved out of the
    /// name into their own fields before the remaining text, unit and
    /// context are normalized.
    pub fn normalize(&self, ids: &FlowIdAllocator) -> Result<Flow> {
        let name = self.remove_unit_slash();
        let (name, suffix_location) = split_location_suffix(&name);
        let location = suffix_location.or_else(|| self.location.clone());
        let (name, oxidation_state) = match OxidationState::from_name(&name)? {
            Some((state, rest)) => (rest, Some(state)),
            None => (name, self.oxidation_state),
        };
        Ok(Flow {
            id: ids.next_id(),
            name: StringField::new(name).normalize(),
            unit: self.unit.normalize()?,
            context: self.context.normalize(),
            identifier: self.identifier.clone(),
            location,
            oxidation_state,
            cas_number: self.cas_number.clone(),
            synonyms: self.synonyms.clone(),
            conversion_factor: self.conversion_factor,
        })
    }

    fn remove_unit_slash(&self) -> String {
        let name = self.name.as_str();
        let Some(captures) = UNIT_SLASH.captures(name) else {
            return name.to_string();
        };
        let (Some(whole), Some(unit)) = (captures.get(0), captures.name("unit")) else {
            return name.to_string();
        };
        let implied = UnitField::new(unit.as_str());
        if !self.unit.compatible(&implied) {
            warn!(
                flow = %self,
                declared = %self.unit,
                implied = %implied,
                "flow name refers to a unit incompatible with its declared unit"
            );
        }
        if whole.end() == name.len() {
            name[..whole.start()].to_string()
        } else {
            format!("{}, {}", &name[..whole.start()], &name[whole.end()..])
        }
    }

    /// Same flow under another location, as a brand-new flow record.
    ///
    /// The location code at the end of the name is swapped for `location`
    /// and a fresh UUID identifier is assigned. Fails when the name has no
    /// recognized location suffix.
    pub fn copy_with_new_location(&self, location: &str, ids: &FlowIdAllocator) -> Result<Flow> {
        let name = replace_location_suffix(self.name.as_str(), location).map_err(|_| {
            ModelError::MissingLocationSuffix {
                name: self.name.to_string(),
            }
        })?;
        Ok(self.relocated(name, location, ids))
    }

    /// Regionalized copy of a flow whose name carries no location yet.
    pub fn copy_with_added_location(&self, location: &str, ids: &FlowIdAllocator) -> Flow {
        let name = format!("{}, {}", self.name, location);
        self.relocated(name, location, ids)
    }

    fn relocated(&self, name: String, location: &str, ids: &FlowIdAllocator) -> Flow {
        Flow {
            id: ids.next_id(),
            name: StringField::new(name),
            location: self.location.as_ref().map(|_| location.to_string()),
            identifier: Some(uuid::Uuid::new_v4().to_string()),
            ..self.clone()
        }
    }

    /// This flow with the fields set in `update` overridden.
    ///
    /// Overrides are brought into normalized form so they compare against
    /// normalized flows: names and contexts are normalized, units are
    /// normalized when the registry knows them. Identity is kept.
    pub fn with_update(&self, update: &FlowUpdate) -> Flow {
        let mut flow = self.clone();
        if let Some(name) = &update.name {
            flow.name = name.normalize();
        }
        if let Some(unit) = &update.unit {
            flow.unit = unit.normalize().unwrap_or_else(|_| unit.clone());
        }
        if let Some(context) = &update.context {
            flow.context = context.normalize();
        }
        if let Some(location) = &update.location {
            flow.location = Some(location.clone());
        }
        if update.oxidation_state.is_some() {
            flow.oxidation_state = update.oxidation_state;
        }
        if update.conversion_factor.is_some() {
            flow.conversion_factor = update.conversion_factor;
        }
        flow
    }

    pub fn export(&self) -> FlowExport {
        FlowExport {
            name: self.name.to_string(),
            unit: self.unit.to_string(),
            context: self.context.segments().to_vec(),
            identifier: self.identifier.clone(),
            cas_number: self.cas_number.as_ref().map(ToString::to_string),
            location: self.location.clone(),
        }
    }
}

impl PartialEq for Flow {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Flow {}

impl Hash for Flow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Flow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Flow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.unit, self.context)?;
        if let Some(location) = &self.location {
            write!(f, " @ {location}")?;
        }
        Ok(())
    }
}

/// Flow dictionary used in match exports; empty fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowExport {
    pub name: String,
    pub unit: String,
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
