//! Rule configuration.
//!
//! ```toml
//! rules = ["match_identical_identifier", "match_identical_names"]
//! regionalization_cutoff = 3
//! close_names_max_distance = 3
//! transitive_transformations = "tables/ecoinvent-3.9-3.10.json"
//! source_transformations = ["tables/simapro-ecoinvent.json"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use flowmap_standards::MigrationTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::rule::MatchRule;
use crate::rules::{
    RuleKind, add_missing_regionalized_flows, match_close_names,
    match_ecoinvent_transitive_matching, match_identical_cas_numbers, match_identical_identifier,
    match_identical_names, match_identical_names_without_commas, match_name_and_parent_context,
    match_names_with_source_transformations, match_resources_with_wrong_subcontext,
};
use crate::transform::Migration;

pub const DEFAULT_REGIONALIZATION_CUTOFF: usize = 3;
pub const DEFAULT_CLOSE_NAMES_MAX_DISTANCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Rule names in the order they run.
    pub rules: Vec<String>,
    /// Minimum number of sibling targets before a regional flow is added.
    pub regionalization_cutoff: usize,
    /// Exclusive edit-distance bound for `match_close_names`.
    pub close_names_max_distance: usize,
    pub transitive_transformations: Option<PathBuf>,
    pub source_transformations: Vec<PathBuf>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            rules: RuleKind::defaults().map(|kind| kind.name().to_string()).collect(),
            regionalization_cutoff: DEFAULT_REGIONALIZATION_CUTOFF,
            close_names_max_distance: DEFAULT_CLOSE_NAMES_MAX_DISTANCE,
            transitive_transformations: None,
            source_transformations: Vec::new(),
        }
    }
}

impl MatchingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| MapError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| MapError::ConfigToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.rule_kinds()?;
        debug!(
            path = %path.display(),
            rules = config.rules.len(),
            "loaded matching config"
        );
        Ok(config)
    }

    /// The configured rules, validated.
    pub fn rule_kinds(&self) -> Result<Vec<RuleKind>> {
        self.rules.iter().map(|name| name.parse()).collect()
    }

    /// Builds the rule list, loading migration tables as needed.
    ///
    /// Rules whose migration tables are not configured are left out.
    pub fn build_rules(&self) -> Result<Vec<MatchRule>> {
        let mut rules = Vec::new();
        for kind in self.rule_kinds()? {
            let name = kind.name();
            let condition = kind.condition();
            let rule = match kind {
                RuleKind::IdenticalIdentifier => {
                    MatchRule::new(name, condition, match_identical_identifier)
                }
                RuleKind::IdenticalNames => MatchRule::new(name, condition, match_identical_names),
                RuleKind::IdenticalNamesWithoutCommas => {
                    MatchRule::new(name, condition, match_identical_names_without_commas)
                }
                RuleKind::ResourcesWithWrongSubcontext => {
                    MatchRule::new(name, condition, match_resources_with_wrong_subcontext)
                }
                RuleKind::NameAndParentContext => {
                    MatchRule::new(name, condition, match_name_and_parent_context)
                }
                RuleKind::IdenticalCasNumbers => {
                    MatchRule::new(name, condition, match_identical_cas_numbers)
                }
                RuleKind::CloseNames => {
                    let max_distance = self.close_names_max_distance;
                    MatchRule::new(name, condition, move |sources, targets, ctx| {
                        match_close_names(sources, targets, ctx, max_distance)
                    })
                }
                RuleKind::AddMissingRegionalizedFlows => {
                    let cutoff = self.regionalization_cutoff;
                    MatchRule::new(name, condition, move |sources, targets, ctx| {
                        add_missing_regionalized_flows(sources, targets, ctx, cutoff)
                    })
                }
                RuleKind::EcoinventTransitive => {
                    let Some(path) = &self.transitive_transformations else {
                        warn!(
                            rule = name,
                            "no transitive migration table configured, skipping rule"
                        );
                        continue;
                    };
                    let migration = Migration::new(MigrationTable::load(path)?);
                    MatchRule::new(name, condition, move |sources, targets, ctx| {
                        match_ecoinvent_transitive_matching(sources, targets, ctx, &migration)
                    })
                }
                RuleKind::NamesWithSourceTransformations => {
                    if self.source_transformations.is_empty() {
                        warn!(
                            rule = name,
                            "no source migration tables configured, skipping rule"
                        );
                        continue;
                    }
                    let migrations = self
                        .source_transformations
                        .iter()
                        .map(|path| MigrationTable::load(path).map(Migration::new))
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    MatchRule::new(name, condition, move |sources, targets, ctx| {
                        match_names_with_source_transformations(sources, targets, ctx, &migrations)
                    })
                }
            };
            rules.push(rule);
        }
        Ok(rules)
    }
}
