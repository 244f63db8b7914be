use flowmap_model::{Match, NormalizedFlow};
use flowmap_standards::split_location_suffix;
use tracing::debug;

use super::RuleKind;
use crate::error::Result;
use crate::matching::{MatchLabel, get_matches, group_sources, index_targets};
use crate::rule::RuleContext;

/// Synthesizes regional target flows for located sources that have none.
///
/// Siblings are targets sharing the source's name, context and oxidation
/// state. When no sibling carries the source's location and at least
/// `cutoff` siblings already have a location, a new target is cloned from
/// the first of them whose name ends in a location code. When the only
/// sibling has no location, it gets the source's location appended.
/// Matches carry `new_target_flow = true`.
pub fn add_missing_regionalized_flows(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    context: &RuleContext<'_>,
    cutoff: usize,
) -> Result<Vec<Match>> {
    let kind = RuleKind::AddMissingRegionalizedFlows;
    let siblings = index_targets(targets, |target| {
        let current = &target.current;
        Some((
            current.name.as_str().to_string(),
            current.context.segments().to_vec(),
            current.oxidation_state,
        ))
    });
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();

    let groups = group_sources(sources, |source| {
        let current = &source.current;
        let location = current.location.clone()?;
        Some((
            (
                current.name.as_str().to_string(),
                current.context.segments().to_vec(),
                current.oxidation_state,
            ),
            location,
        ))
    });
    for ((sibling_key, location), group) in groups {
        let Some(candidates) = siblings.get(&sibling_key) else {
            continue;
        };
        let has_region = candidates.iter().any(|target| {
            target
                .current
                .location
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(&location))
        });
        if has_region {
            continue;
        }
        let (regional, global): (Vec<&NormalizedFlow>, Vec<&NormalizedFlow>) = candidates
            .iter()
            .copied()
            .partition(|target| target.current.location.is_some());
        let flow = if regional.len() >= cutoff {
            let Some(template) = regional.iter().find(|target| {
                split_location_suffix(target.original.name.as_str())
                    .1
                    .is_some()
            }) else {
                continue;
            };
            template
                .original
                .copy_with_new_location(&location, context.ids)?
        } else if let ([], [single]) = (regional.as_slice(), global.as_slice()) {
            single
                .original
                .copy_with_added_location(&location, context.ids)
        } else {
            debug!(
                flow = %sibling_key.0,
                location = %location,
                regional = regional.len(),
                cutoff,
                "too few regional siblings to add a regional flow"
            );
            continue;
        };
        let target = NormalizedFlow::from_flow(flow, context.ids)?;
        let found = get_matches(group, &[&target], label);
        if !found.is_empty() {
            debug!(
                flow = %target.original,
                identifier = target.original.identifier.as_deref().unwrap_or_default(),
                sources = found.len(),
                "added regionalized target flow"
            );
        }
        matches.extend(
            found
                .into_iter()
                .map(|found| found.with_new_target_flow(true)),
        );
    }
    Ok(matches)
}
