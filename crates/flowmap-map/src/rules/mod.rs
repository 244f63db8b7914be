//! The built-in matching rules.
//!
//! [`RuleKind::ALL`] lists them in default priority order, from the most
//! certain and cheapest to the most speculative.

mod context;
mod fuzzy;
mod identity;
mod regional;
mod transformed;

use std::fmt;
use std::str::FromStr;

use flowmap_model::{Flow, MatchCondition, OxidationState};

use crate::error::MapError;

pub use context::{match_name_and_parent_context, match_resources_with_wrong_subcontext};
pub use fuzzy::match_close_names;
pub use identity::{
    match_identical_cas_numbers, match_identical_identifier, match_identical_names,
    match_identical_names_without_commas,
};
pub use regional::add_missing_regionalized_flows;
pub use transformed::{match_ecoinvent_transitive_matching, match_names_with_source_transformations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    IdenticalIdentifier,
    IdenticalNames,
    IdenticalNamesWithoutCommas,
    EcoinventTransitive,
    ResourcesWithWrongSubcontext,
    NameAndParentContext,
    CloseNames,
    NamesWithSourceTransformations,
    IdenticalCasNumbers,
    AddMissingRegionalizedFlows,
}

impl RuleKind {
    pub const ALL: [RuleKind; 10] = [
        RuleKind::IdenticalIdentifier,
        RuleKind::IdenticalNames,
        RuleKind::IdenticalNamesWithoutCommas,
        RuleKind::EcoinventTransitive,
        RuleKind::ResourcesWithWrongSubcontext,
        RuleKind::NameAndParentContext,
        RuleKind::CloseNames,
        RuleKind::NamesWithSourceTransformations,
        RuleKind::IdenticalCasNumbers,
        RuleKind::AddMissingRegionalizedFlows,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::IdenticalIdentifier => "match_identical_identifier",
            RuleKind::IdenticalNames => "match_identical_names",
            RuleKind::IdenticalNamesWithoutCommas => "match_identical_names_without_commas",
            RuleKind::EcoinventTransitive => "match_ecoinvent_transitive_matching",
            RuleKind::ResourcesWithWrongSubcontext => "match_resources_with_wrong_subcontext",
            RuleKind::NameAndParentContext => "match_name_and_parent_context",
            RuleKind::CloseNames => "match_close_names",
            RuleKind::NamesWithSourceTransformations => "match_names_with_source_transformations",
            RuleKind::IdenticalCasNumbers => "match_identical_cas_numbers",
            RuleKind::AddMissingRegionalizedFlows => "add_missing_regionalized_flows",
        }
    }

    pub fn condition(self) -> MatchCondition {
        match self {
            RuleKind::IdenticalIdentifier
            | RuleKind::IdenticalNames
            | RuleKind::IdenticalCasNumbers => MatchCondition::Exact,
            RuleKind::IdenticalNamesWithoutCommas
            | RuleKind::EcoinventTransitive
            | RuleKind::ResourcesWithWrongSubcontext => MatchCondition::Close,
            RuleKind::NameAndParentContext
            | RuleKind::CloseNames
            | RuleKind::NamesWithSourceTransformations
            | RuleKind::AddMissingRegionalizedFlows => MatchCondition::Related,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleKind::IdenticalIdentifier => "same identifier",
            RuleKind::IdenticalNames => "same name, context, oxidation state and location",
            RuleKind::IdenticalNamesWithoutCommas => "same name ignoring commas",
            RuleKind::EcoinventTransitive => "same name after a transitive migration table",
            RuleKind::ResourcesWithWrongSubcontext => {
                "resources with the same name in another subcontext"
            }
            RuleKind::NameAndParentContext => "same name in the parent context",
            RuleKind::CloseNames => "names within a small edit distance",
            RuleKind::NamesWithSourceTransformations => "same name after source migration tables",
            RuleKind::IdenticalCasNumbers => "same CAS number, context and location",
            RuleKind::AddMissingRegionalizedFlows => "new regional target cloned from its siblings",
        }
    }

    /// Whether the rule is part of the default rule set.
    pub fn is_default(self) -> bool {
        !matches!(self, RuleKind::CloseNames | RuleKind::AddMissingRegionalizedFlows)
    }

    pub fn defaults() -> impl Iterator<Item = RuleKind> {
        Self::ALL.into_iter().filter(|kind| kind.is_default())
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name || kind.name().strip_prefix("match_") == Some(name))
            .ok_or_else(|| MapError::UnknownRule {
                name: name.to_string(),
            })
    }
}

/// Name, context, oxidation state and location of a flow's current form.
pub(crate) type NameKey = (String, Vec<String>, Option<OxidationState>, Option<String>);

pub(crate) fn location_key(flow: &Flow) -> Option<String> {
    flow.location.as_deref().map(str::to_lowercase)
}

pub(crate) fn name_key(flow: &Flow) -> NameKey {
    (
        flow.name.as_str().to_string(),
        flow.context.segments().to_vec(),
        flow.oxidation_state,
        location_key(flow),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_names() {
        assert_eq!(
            "match_identical_names".parse::<RuleKind>().unwrap(),
            RuleKind::IdenticalNames
        );
        assert_eq!(
            "close_names".parse::<RuleKind>().unwrap(),
            RuleKind::CloseNames
        );
        assert!(matches!(
            "match_everything".parse::<RuleKind>(),
            Err(MapError::UnknownRule { .. })
        ));
    }

    #[test]
    fn default_set_excludes_speculative_rules() {
        let defaults: Vec<_> = RuleKind::defaults().collect();
        assert_eq!(defaults.len(), 8);
        assert!(!defaults.contains(&RuleKind::CloseNames));
        assert!(!defaults.contains(&RuleKind::AddMissingRegionalizedFlows));
        assert_eq!(defaults[0], RuleKind::IdenticalIdentifier);
    }
}
