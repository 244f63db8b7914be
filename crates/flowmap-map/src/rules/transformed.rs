use flowmap_model::{Match, NormalizedFlow};

use super::{RuleKind, location_key, name_key};
use crate::error::Result;
use crate::matching::{MatchLabel, get_matches, group_sources, index_targets};
use crate::rule::RuleContext;
use crate::transform::{Migration, Transform, TransformationScope};

/// Passes both lists through `migration`, then matches on name, context and
/// location. Every flow is reset before this returns.
pub fn match_ecoinvent_transitive_matching(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
    migration: &Migration,
) -> Result<Vec<Match>> {
    let kind = RuleKind::EcoinventTransitive;
    let apply = |flow: &mut NormalizedFlow| migration.apply(flow);
    let mut scope = TransformationScope::enter(sources, targets, &[&apply]);
    let (sources, targets) = scope.flows();

    let key = |flow: &NormalizedFlow| {
        let current = &flow.current;
        Some((
            current.name.as_str().to_lowercase(),
            current.context.segments().to_vec(),
            location_key(current),
        ))
    };
    let index = index_targets(targets, key);
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();
    for (k, group) in group_sources(sources, key) {
        if let Some(candidates) = index.get(&k) {
            matches.extend(get_matches(group, candidates, label));
        }
    }
    Ok(matches)
}

/// Passes sources through each migration in turn, then matches on name,
/// context, oxidation state and location. Targets are left untouched.
pub fn match_names_with_source_transformations(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
    migrations: &[Migration],
) -> Result<Vec<Match>> {
    let kind = RuleKind::NamesWithSourceTransformations;
    let appliers: Vec<_> = migrations
        .iter()
        .map(|migration| move |flow: &mut NormalizedFlow| migration.apply(flow))
        .collect();
    let transforms: Vec<&Transform<'_>> = appliers
        .iter()
        .map(|apply| apply as &Transform<'_>)
        .collect();

    let index = index_targets(targets, |target| Some(name_key(&target.current)));
    let mut untouched: [NormalizedFlow; 0] = [];
    let mut scope = TransformationScope::enter(sources, &mut untouched, &transforms);
    let (sources, _) = scope.flows();
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();
    for (k, group) in group_sources(sources, |source| Some(name_key(&source.current))) {
        if let Some(candidates) = index.get(&k) {
            matches.extend(get_matches(group, candidates, label));
        }
    }
    Ok(matches)
}
