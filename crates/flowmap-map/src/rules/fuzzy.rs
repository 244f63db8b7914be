use flowmap_model::{Match, NormalizedFlow};
use rapidfuzz::distance::damerau_levenshtein;

use super::{RuleKind, location_key, name_key};
use crate::error::Result;
use crate::matching::{MatchLabel, get_matches, group_sources, index_targets};
use crate::rule::RuleContext;

/// Names within `max_distance` edits (exclusive) of each other, with the
/// same context, oxidation state and location.
///
/// Normalized names are lowercase, so the comparison ignores case.
pub fn match_close_names(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
    max_distance: usize,
) -> Result<Vec<Match>> {
    let kind = RuleKind::CloseNames;
    let index = index_targets(targets, |target| {
        let current = &target.current;
        Some((
            current.context.segments().to_vec(),
            current.oxidation_state,
            location_key(current),
        ))
    });
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();
    for ((name, context, oxidation_state, location), group) in
        group_sources(sources, |source| Some(name_key(&source.current)))
    {
        let Some(candidates) = index.get(&(context, oxidation_state, location)) else {
            continue;
        };
        let close: Vec<&NormalizedFlow> = candidates
            .iter()
            .copied()
            .filter(|target| {
                let other = target.current.name.as_str();
                damerau_levenshtein::distance(name.chars(), other.chars()) < max_distance
            })
            .collect();
        if !close.is_empty() {
            matches.extend(get_matches(group, &close, label));
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use flowmap_model::{Flow, FlowIdAllocator, FlowRecord};

    use super::*;

    fn normalized(ids: &FlowIdAllocator, name: &str, context: &str) -> NormalizedFlow {
        let record = FlowRecord::new(name, "kg", context);
        NormalizedFlow::from_flow(Flow::from_record(record, ids).unwrap(), ids).unwrap()
    }

    #[test]
    fn matches_within_distance() {
        let ids = FlowIdAllocator::new();
        let mut source = normalized(&ids, "Sulphur dioxide", "air");
        let mut targets = vec![
            normalized(&ids, "Sulfur dioxide", "air"),
            normalized(&ids, "Sulfur dioxide", "water"),
        ];
        let ctx = RuleContext { ids: &ids };
        let found = match_close_names(&mut [&mut source], &mut targets, &ctx, 3).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, targets[0].original);
    }

    #[test]
    fn distance_bound_is_exclusive() {
        let ids = FlowIdAllocator::new();
        // "abcdef" -> "abcxyz" takes three substitutions
        let mut source = normalized(&ids, "abcdef", "air");
        let mut targets = vec![normalized(&ids, "abcxyz", "air")];
        let ctx = RuleContext { ids: &ids };
        let strict = match_close_names(&mut [&mut source], &mut targets, &ctx, 3).unwrap();
        assert!(strict.is_empty());
        let loose = match_close_names(&mut [&mut source], &mut targets, &ctx, 4).unwrap();
        assert_eq!(loose.len(), 1);
    }

    #[test]
    fn transposition_counts_once() {
        let ids = FlowIdAllocator::new();
        let mut source = normalized(&ids, "Ammonai", "air");
        let mut targets = vec![normalized(&ids, "Ammonia", "air")];
        let ctx = RuleContext { ids: &ids };
        let found = match_close_names(&mut [&mut source], &mut targets, &ctx, 2).unwrap();
        assert_eq!(found.len(), 1);
    }
}
