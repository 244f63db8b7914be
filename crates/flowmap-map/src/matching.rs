//! The matching primitive shared by every rule.

use std::collections::HashMap;
use std::hash::Hash;

use flowmap_model::{Match, MatchCondition, NormalizedFlow};

/// Provenance attached to every match a rule emits.
#[derive(Debug, Clone, Copy)]
pub struct MatchLabel<'a> {
    pub function_name: &'a str,
    pub condition: MatchCondition,
    pub comment: &'a str,
}

impl<'a> MatchLabel<'a> {
    pub fn new(function_name: &'a str, condition: MatchCondition) -> Self {
        Self {
            function_name,
            condition,
            comment: "",
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &'a str) -> Self {
        self.comment = comment;
        self
    }
}

/// Matches each source against rule-selected candidates.
///
/// Candidates are narrowed to unit-compatible flows, then, if several
/// remain, to flows whose normalized context equals the source's. A match is emitted only
/// when exactly one candidate survives; the source is then marked matched.
/// Sources already marked matched are skipped.
pub fn get_matches<'s>(
    sources: impl IntoIterator<Item = &'s mut NormalizedFlow>,
    candidates: &[&NormalizedFlow],
    label: MatchLabel<'_>,
) -> Vec<Match> {
    let mut matches = Vec::new();
    for source in sources {
        if source.matched {
            continue;
        }
        let mut targets: Vec<&NormalizedFlow> = candidates
            .iter()
            .copied()
            .filter(|target| source.unit_compatible(target))
            .collect();
        if targets.len() > 1 {
            targets.retain(|target| {
                target.normalized.context.segments() == source.normalized.context.segments()
            });
        }
        let [target] = targets.as_slice() else {
            continue;
        };
        matches.push(
            Match::new(
                source.original.clone(),
                target.original.clone(),
                label.function_name,
                label.condition,
            )
            .with_conversion_factor(source.conversion_factor(target))
            .with_comment(label.comment),
        );
        source.matched = true;
    }
    matches
}

/// Groups sources by key, keeping first-seen order. Sources without a key
/// are left out.
pub fn group_sources<'s, K, F>(
    sources: &'s mut [&mut NormalizedFlow],
    mut key: F,
) -> Vec<(K, Vec<&'s mut NormalizedFlow>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&NormalizedFlow) -> Option<K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'s mut NormalizedFlow>)> = Vec::new();
    for source in sources.iter_mut() {
        let Some(k) = key(&**source) else {
            continue;
        };
        match positions.get(&k) {
            Some(&idx) => groups[idx].1.push(&mut **source),
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push((k, vec![&mut **source]));
            }
        }
    }
    groups
}

/// Indexes targets by key, keeping list order within each key.
pub fn index_targets<'t, K, F>(
    targets: &'t [NormalizedFlow],
    mut key: F,
) -> HashMap<K, Vec<&'t NormalizedFlow>>
where
    K: Eq + Hash,
    F: FnMut(&NormalizedFlow) -> Option<K>,
{
    let mut index: HashMap<K, Vec<&'t NormalizedFlow>> = HashMap::new();
    for target in targets {
        if let Some(k) = key(target) {
            index.entry(k).or_default().push(target);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use flowmap_model::{ContextField, Flow, FlowIdAllocator, FlowRecord, FlowUpdate};

    use super::*;

    fn flow(ids: &FlowIdAllocator, name: &str, unit: &str, context: &str) -> NormalizedFlow {
        let flow = Flow::from_record(FlowRecord::new(name, unit, context), ids).unwrap();
        NormalizedFlow::from_flow(flow, ids).unwrap()
    }

    const LABEL: MatchLabel<'static> = MatchLabel {
        function_name: "test",
        condition: MatchCondition::Exact,
        comment: "",
    };

    #[test]
    fn ambiguous_candidates_are_dropped() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Ammonia", "kg", "air");
        let a = flow(&ids, "Ammonia", "kg", "air");
        let b = flow(&ids, "Ammonia", "g", "air");
        let found = get_matches([&mut source], &[&a, &b], LABEL);
        assert!(found.is_empty());
        assert!(!source.matched);
    }

    #[test]
    fn context_breaks_ties() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Ammonia", "kg", "air");
        let a = flow(&ids, "Ammonia", "kg", "air/urban");
        let b = flow(&ids, "Ammonia", "kg", "air");
        let found = get_matches([&mut source], &[&a, &b], LABEL);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, b.original);
        assert!(source.matched);
    }

    #[test]
    fn ties_break_on_normalized_context() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Ammonia", "kg", "air");
        source.update_current(FlowUpdate {
            context: Some(ContextField::from_path("air/urban")),
            ..FlowUpdate::default()
        });
        let urban = flow(&ids, "Ammonia", "kg", "air/urban");
        let air = flow(&ids, "Ammonia", "kg", "air");
        let found = get_matches([&mut source], &[&urban, &air], LABEL);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, air.original);
    }

    #[test]
    fn emits_the_filtered_candidate() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Water", "m3", "water");
        let wrong_unit = flow(&ids, "Water", "kg", "water");
        let right = flow(&ids, "Water", "l", "water");
        let found = get_matches([&mut source], &[&wrong_unit, &right], LABEL);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, right.original);
        assert_eq!(found[0].conversion_factor, 1000.0);
    }

    #[test]
    fn skips_matched_sources() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Ammonia", "kg", "air");
        source.matched = true;
        let target = flow(&ids, "Ammonia", "kg", "air");
        assert!(get_matches([&mut source], &[&target], LABEL).is_empty());
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let ids = FlowIdAllocator::new();
        let mut a = flow(&ids, "B", "kg", "air");
        let mut b = flow(&ids, "A", "kg", "air");
        let mut c = flow(&ids, "B", "kg", "air");
        let mut sources = vec![&mut a, &mut b, &mut c];
        let groups = group_sources(&mut sources, |f| Some(f.current.name.to_string()));
        let keys: Vec<_> = groups.iter().map(|(k, g)| (k.clone(), g.len())).collect();
        assert_eq!(keys, [("b".to_string(), 2), ("a".to_string(), 1)]);
    }
}
