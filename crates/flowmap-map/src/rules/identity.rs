use std::hash::Hash;

use flowmap_model::{Flow, Match, NormalizedFlow};

use super::{RuleKind, location_key, name_key};
use crate::error::Result;
use crate::matching::{MatchLabel, get_matches, group_sources, index_targets};
use crate::rule::RuleContext;

/// Groups sources and indexes targets by the same key, then matches each
/// group against the targets sharing its key.
fn match_by_key<K, F>(
    kind: RuleKind,
    sources: &mut [&mut NormalizedFlow],
    targets: &[NormalizedFlow],
    key: F,
) -> Vec<Match>
where
    K: Eq + Hash + Clone,
    F: Fn(&Flow) -> Option<K>,
{
    let index = index_targets(targets, |target| key(&target.current));
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();
    for (k, group) in group_sources(sources, |source| key(&source.current)) {
        if let Some(candidates) = index.get(&k) {
            matches.extend(get_matches(group, candidates, label));
        }
    }
    matches
}

pub fn match_identical_identifier(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    Ok(match_by_key(
        RuleKind::IdenticalIdentifier,
        sources,
        targets,
        |flow| flow.identifier.clone(),
    ))
}

pub fn match_identical_names(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    Ok(match_by_key(RuleKind::IdenticalNames, sources, targets, |flow| {
        Some(name_key(flow))
    }))
}

pub fn match_identical_names_without_commas(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    Ok(match_by_key(
        RuleKind::IdenticalNamesWithoutCommas,
        sources,
        targets,
        |flow| {
            let (_, context, oxidation_state, location) = name_key(flow);
            Some((flow.name.without_commas(), context, oxidation_state, location))
        },
    ))
}

pub fn match_identical_cas_numbers(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    Ok(match_by_key(
        RuleKind::IdenticalCasNumbers,
        sources,
        targets,
        |flow| {
            let cas = flow.cas_number.as_ref()?;
            Some((
                cas.as_str().to_string(),
                flow.context.segments().to_vec(),
                location_key(flow),
            ))
        },
    ))
}
