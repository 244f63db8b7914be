//! Match records produced by the matching rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::flow::{Flow, FlowExport};

/// Confidence tier of a match, after the SKOS mapping relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchCondition {
    Exact,
    Close,
    Related,
    Narrow,
    Broad,
}

impl MatchCondition {
    pub const ALL: [MatchCondition; 5] = [
        MatchCondition::Exact,
        MatchCondition::Close,
        MatchCondition::Related,
        MatchCondition::Narrow,
        MatchCondition::Broad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MatchCondition::Exact => "exact",
            MatchCondition::Close => "close",
            MatchCondition::Related => "related",
            MatchCondition::Narrow => "narrow",
            MatchCondition::Broad => "broad",
        }
    }

    pub fn as_uri(self) -> &'static str {
        match self {
            MatchCondition::Exact => "http://www.w3.org/2004/02/skos/core#exactMatch",
            MatchCondition::Close => "http://www.w3.org/2004/02/skos/core#closeMatch",
            MatchCondition::Related => "http://www.w3.org/2004/02/skos/core#relatedMatch",
            MatchCondition::Narrow => "http://www.w3.org/2004/02/skos/core#narrowMatch",
            MatchCondition::Broad => "http://www.w3.org/2004/02/skos/core#broadMatch",
        }
    }

    /// Single-character symbol used in GLAD mapping files.
    pub fn as_glad(self) -> &'static str {
        match self {
            MatchCondition::Exact => "=",
            MatchCondition::Close | MatchCondition::Related => "~",
            MatchCondition::Narrow => ">",
            MatchCondition::Broad => "<",
        }
    }
}

impl fmt::Display for MatchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source flow paired with a target flow.
///
/// Both sides are the flows as loaded, not their normalized forms.
#[derive(Debug, Clone)]
pub struct Match {
    pub source: Flow,
    pub target: Flow,
    /// Name of the rule that produced the match.
    pub function_name: String,
    pub condition: MatchCondition,
    pub conversion_factor: f64,
    pub comment: String,
    /// The target was synthesized by the rule and is not in the input list.
    pub new_target_flow: bool,
}

impl Match {
    pub fn new(
        source: Flow,
        target: Flow,
        function_name: impl Into<String>,
        condition: MatchCondition,
    ) -> Self {
        Self {
            source,
            target,
            function_name: function_name.into(),
            condition,
            conversion_factor: 1.0,
            comment: String::new(),
            new_target_flow: false,
        }
    }

    #[must_use]
    pub fn with_conversion_factor(mut self, factor: f64) -> Self {
        self.conversion_factor = factor;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn with_new_target_flow(mut self, new_target_flow: bool) -> Self {
        self.new_target_flow = new_target_flow;
        self
    }

    pub fn export(&self, flowmapper_metadata: bool) -> MatchExport {
        MatchExport {
            source: self.source.export(),
            target: self.target.export(),
            condition: self.condition.as_uri().to_string(),
            conversion_factor: self.conversion_factor,
            comment: self.comment.clone(),
            new_target_flow: self.new_target_flow,
            flowmapper_metadata: flowmapper_metadata.then(|| FlowmapperMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                function_name: self.function_name.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowmapperMetadata {
    pub version: String,
    pub function_name: String,
}

/// Serialized form of a [`Match`], one entry of a migration package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExport {
    pub source: FlowExport,
    pub target: FlowExport,
    pub condition: String,
    pub conversion_factor: f64,
    pub comment: String,
    pub new_target_flow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowmapper_metadata: Option<FlowmapperMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowRecord;
    use crate::ids::FlowIdAllocator;

    #[test]
    fn glad_symbols() {
        let symbols: Vec<_> = MatchCondition::ALL.iter().map(|c| c.as_glad()).collect();
        assert_eq!(symbols, ["=", "~", "~", ">", "<"]);
    }

    #[test]
    fn metadata_is_optional() {
        let ids = FlowIdAllocator::new();
        let source = Flow::from_record(FlowRecord::new("Ammonia", "kg", "air"), &ids).unwrap();
        let target = Flow::from_record(FlowRecord::new("Ammonia", "kg", "air"), &ids).unwrap();
        let found = Match::new(source, target, "match_identical_names", MatchCondition::Exact);

        assert!(found.export(false).flowmapper_metadata.is_none());
        let metadata = found.export(true).flowmapper_metadata.unwrap();
        assert_eq!(metadata.function_name, "match_identical_names");
        assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            found.export(true).condition,
            "http://www.w3.org/2004/02/skos/core#exactMatch"
        );
    }
}
