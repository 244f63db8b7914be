//! The mapping run: rules applied in order to a source and a target list.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use flowmap_model::{Flow, FlowId, FlowIdAllocator, Match, NormalizedFlow};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::error::{MapError, Result};
use crate::rule::{MatchRule, RuleContext};

/// Outcome of one rule in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub matches: usize,
    /// Sources still unmatched after the rule ran.
    pub unmatched_remaining: usize,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::ManyToMany => "N:M",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardinalityRow {
    pub source: FlowId,
    pub target: FlowId,
    pub cardinality: Cardinality,
}

/// Match coverage of one context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStatistics {
    pub context: String,
    pub matched: usize,
    pub total: usize,
    /// `matched / total` as a percentage; 0 when `total` is 0.
    pub percent: f64,
}

/// Source and target flow lists plus the rules that map one onto the other.
pub struct Flowmap {
    sources: Vec<NormalizedFlow>,
    targets: Vec<NormalizedFlow>,
    rules: Vec<MatchRule>,
    ids: FlowIdAllocator,
    matches: Vec<Match>,
    summaries: Vec<RuleSummary>,
    generated: bool,
    matched_source_ids: OnceCell<HashSet<FlowId>>,
}

impl Flowmap {
    /// Normalizes both flow lists. `ids` must be the allocator the flows were
    /// built with so synthesized flows get fresh ids.
    pub fn new(
        sources: Vec<Flow>,
        targets: Vec<Flow>,
        rules: Vec<MatchRule>,
        ids: FlowIdAllocator,
    ) -> Result<Self> {
        let sources = normalize_all(sources, &ids)?;
        let targets = normalize_all(targets, &ids)?;
        Ok(Self {
            sources,
            targets,
            rules,
            ids,
            matches: Vec::new(),
            summaries: Vec::new(),
            generated: false,
            matched_source_ids: OnceCell::new(),
        })
    }

    /// Runs every rule in order against the still-unmatched sources.
    ///
    /// Targets synthesized by a rule are normalized and appended to the
    /// target list before the next rule runs. A flow map can be matched
    /// once; a second call fails with [`MapError::AlreadyMatched`].
    pub fn generate_matches(&mut self) -> Result<&[Match]> {
        if self.generated {
            return Err(MapError::AlreadyMatched);
        }
        self.generated = true;
        self.matched_source_ids = OnceCell::new();

        let span = info_span!(
            "generate_matches",
            sources = self.sources.len(),
            targets = self.targets.len(),
            rules = self.rules.len()
        );
        let _enter = span.enter();
        let run_start = Instant::now();
        let context = RuleContext { ids: &self.ids };

        for rule in &self.rules {
            let start = Instant::now();
            let mut unmatched: Vec<&mut NormalizedFlow> =
                self.sources.iter_mut().filter(|flow| !flow.matched).collect();
            let found = rule.apply(&mut unmatched, &mut self.targets, &context)?;
            let unmatched_remaining = unmatched.iter().filter(|flow| !flow.matched).count();

            let mut known: HashSet<FlowId> = HashSet::new();
            for found_match in found.iter().filter(|m| m.new_target_flow) {
                let target = &found_match.target;
                if !known.insert(target.id()) {
                    continue;
                }
                debug!(
                    rule = rule.name(),
                    flow = %target,
                    identifier = target.identifier.as_deref().unwrap_or_default(),
                    "appending synthesized target flow"
                );
                self.targets
                    .push(NormalizedFlow::from_flow(target.clone(), &self.ids)?);
            }

            let elapsed = start.elapsed();
            info!(
                rule = rule.name(),
                matches = found.len(),
                unmatched = unmatched_remaining,
                elapsed_ms = elapsed.as_millis() as u64,
                "rule finished"
            );
            self.summaries.push(RuleSummary {
                name: rule.name().to_string(),
                matches: found.len(),
                unmatched_remaining,
                elapsed,
            });
            self.matches.extend(found);
        }

        info!(
            matches = self.matches.len(),
            elapsed_ms = run_start.elapsed().as_millis() as u64,
            "matching finished"
        );
        Ok(&self.matches)
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn rule_summaries(&self) -> &[RuleSummary] {
        &self.summaries
    }

    pub fn source_flows(&self) -> &[NormalizedFlow] {
        &self.sources
    }

    /// Targets including any synthesized during the run.
    pub fn target_flows(&self) -> &[NormalizedFlow] {
        &self.targets
    }

    fn matched_source_ids(&self) -> &HashSet<FlowId> {
        self.matched_source_ids
            .get_or_init(|| self.matches.iter().map(|m| m.source.id()).collect())
    }

    fn matched_target_ids(&self) -> HashSet<FlowId> {
        self.matches.iter().map(|m| m.target.id()).collect()
    }

    pub fn matched_source(&self) -> Vec<&Flow> {
        let ids = self.matched_source_ids();
        originals(&self.sources)
            .filter(|flow| ids.contains(&flow.id()))
            .collect()
    }

    pub fn unmatched_source(&self) -> Vec<&Flow> {
        let ids = self.matched_source_ids();
        originals(&self.sources)
            .filter(|flow| !ids.contains(&flow.id()))
            .collect()
    }

    pub fn matched_target(&self) -> Vec<&Flow> {
        let ids = self.matched_target_ids();
        originals(&self.targets)
            .filter(|flow| ids.contains(&flow.id()))
            .collect()
    }

    pub fn unmatched_target(&self) -> Vec<&Flow> {
        let ids = self.matched_target_ids();
        originals(&self.targets)
            .filter(|flow| !ids.contains(&flow.id()))
            .collect()
    }

    /// Classifies each match by how often its source and target occur.
    pub fn cardinalities(&self) -> Vec<CardinalityRow> {
        let mut per_source: HashMap<FlowId, usize> = HashMap::new();
        let mut per_target: HashMap<FlowId, usize> = HashMap::new();
        for m in &self.matches {
            *per_source.entry(m.source.id()).or_default() += 1;
            *per_target.entry(m.target.id()).or_default() += 1;
        }
        let mut rows: Vec<CardinalityRow> = self
            .matches
            .iter()
            .map(|m| {
                let sources = per_target[&m.target.id()];
                let targets = per_source[&m.source.id()];
                let cardinality = match (sources > 1, targets > 1) {
                    (false, false) => Cardinality::OneToOne,
                    (false, true) => Cardinality::OneToMany,
                    (true, false) => Cardinality::ManyToOne,
                    (true, true) => Cardinality::ManyToMany,
                };
                CardinalityRow {
                    source: m.source.id(),
                    target: m.target.id(),
                    cardinality,
                }
            })
            .collect();
        rows.sort_by_key(|row| row.source);
        rows
    }

    /// Per-context coverage of the source list, worst-covered first.
    pub fn matched_source_statistics(&self) -> Vec<ContextStatistics> {
        context_statistics(
            self.matches.iter().map(|m| &m.source),
            originals(&self.sources),
        )
    }

    /// Per-context coverage of the target list, worst-covered first.
    pub fn matched_target_statistics(&self) -> Vec<ContextStatistics> {
        context_statistics(
            self.matches.iter().map(|m| &m.target),
            originals(&self.targets),
        )
    }
}

impl fmt::Debug for Flowmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flowmap")
            .field("sources", &self.sources.len())
            .field("targets", &self.targets.len())
            .field("rules", &self.rules)
            .field("matches", &self.matches.len())
            .finish_non_exhaustive()
    }
}

fn normalize_all(flows: Vec<Flow>, ids: &FlowIdAllocator) -> Result<Vec<NormalizedFlow>> {
    flows
        .into_iter()
        .map(|flow| NormalizedFlow::from_flow(flow, ids).map_err(MapError::from))
        .collect()
}

fn originals(flows: &[NormalizedFlow]) -> impl Iterator<Item = &Flow> {
    flows.iter().map(|flow| &flow.original)
}

fn context_statistics<'a>(
    matched: impl Iterator<Item = &'a Flow>,
    all: impl Iterator<Item = &'a Flow>,
) -> Vec<ContextStatistics> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for flow in matched {
        counts.entry(flow.context.export_as_string("/")).or_default().0 += 1;
    }
    for flow in all {
        counts.entry(flow.context.export_as_string("/")).or_default().1 += 1;
    }
    let mut rows: Vec<ContextStatistics> = counts
        .into_iter()
        .map(|(context, (matched, total))| ContextStatistics {
            context,
            matched,
            total,
            percent: if total == 0 {
                0.0
            } else {
                matched as f64 / total as f64 * 100.0
            },
        })
        .collect();
    rows.sort_by(|a, b| a.percent.total_cmp(&b.percent));
    rows
}
