//! Context (compartment) of a flow.
//!
//! Input contexts arrive either as a `/`-joined path or as a list of
//! segments. The shape is resolved once at construction; after that a
//! context is always an ordered list of segments. The raw shape is kept
//! for export and for the resource-category test, which searches substrings
//! in unsplit paths but compares whole segments in lists.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Placeholder segments stripped from the end of a normalized context.
pub const MISSING_VALUES: &[&str] = &[
    "",
    "(unknown)",
    "(unspecified)",
    "null",
    "unknown",
    "unspecified",
];

/// Category names that mark a context as a natural resource.
pub const RESOURCE_CATEGORIES: &[&str] = &[
    "natural resources",
    "natural resource",
    "resources",
    "resource",
    "land use",
    "economic",
    "social",
    "raw materials",
    "raw",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawContext {
    Path(String),
    Segments(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ContextField {
    raw: RawContext,
    segments: Vec<String>,
}

impl ContextField {
    pub fn new(raw: RawContext) -> Self {
        let segments = match &raw {
            RawContext::Path(path) if path.contains('/') => {
                path.split('/').map(str::to_string).collect()
            }
            RawContext::Path(path) => vec![path.clone()],
            RawContext::Segments(segments) => segments.clone(),
        };
        Self { raw, segments }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self::new(RawContext::Path(path.into()))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RawContext::Segments(
            segments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Builds a context from a JSON value: a string or a list of strings.
    pub fn from_json(value: &Value) -> Result<Self> {
        let unsupported = || ModelError::UnsupportedContext {
            value: value.to_string(),
        };
        match value {
            Value::String(path) => Ok(Self::from_path(path.clone())),
            Value::Array(items) if !items.is_empty() => {
                let segments = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(unsupported)?;
                Ok(Self::new(RawContext::Segments(segments)))
            }
            _ => Err(unsupported()),
        }
    }

    pub fn raw(&self) -> &RawContext {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lowercased, trimmed segments with trailing placeholders removed.
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self::new(RawContext::Segments(normalize_segments(&self.segments)))
    }

    /// True when `self` is `other` or one of its ancestors.
    ///
    /// `emissions/air` generalizes `emissions/air/urban`.
    pub fn generalizes(&self, other: &ContextField) -> bool {
        self.segments.len() <= other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// The context one level up, when there is one.
    pub fn parent(&self) -> Option<ContextField> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self::new(RawContext::Segments(
            self.segments[..self.segments.len() - 1].to_vec(),
        )))
    }

    pub fn is_resource(&self) -> bool {
        match &self.raw {
            RawContext::Path(path) => {
                let lower = path.to_lowercase();
                RESOURCE_CATEGORIES.iter().any(|cat| lower.contains(cat))
            }
            RawContext::Segments(segments) => segments.iter().any(|segment| {
                let lower = segment.to_lowercase();
                RESOURCE_CATEGORIES.contains(&lower.as_str())
            }),
        }
    }

    pub fn export_as_string(&self, join_character: &str) -> String {
        match &self.raw {
            RawContext::Path(path) => path.clone(),
            RawContext::Segments(segments) => segments.join(join_character),
        }
    }
}

pub fn normalize_segments(segments: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = segments
        .iter()
        .map(|segment| segment.trim().to_lowercase())
        .collect();
    while normalized.len() > 1
        && normalized
            .last()
            .is_some_and(|last| MISSING_VALUES.contains(&last.as_str()))
    {
        normalized.pop();
    }
    normalized
}

impl PartialEq for ContextField {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
            || normalize_segments(&self.segments) == normalize_segments(&other.segments)
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.export_as_string("/"))
    }
}

impl Serialize for ContextField {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.raw.serialize(serializer)
    }
}
