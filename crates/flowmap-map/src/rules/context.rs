use flowmap_model::{Match, NormalizedFlow};

use super::{NameKey, RuleKind, location_key, name_key};
use crate::error::Result;
use crate::matching::{MatchLabel, get_matches, group_sources, index_targets};
use crate::rule::RuleContext;

/// Resources whose subcontext differs between the lists, e.g.
/// `natural resource/in ground` against `natural resource/in water`.
pub fn match_resources_with_wrong_subcontext(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    let kind = RuleKind::ResourcesWithWrongSubcontext;
    let key = |flow: &NormalizedFlow| {
        let current = &flow.current;
        current.context.is_resource().then(|| {
            (
                current.name.as_str().to_string(),
                current.oxidation_state,
                location_key(current),
            )
        })
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

/// Sources filed one level deeper than their target, e.g. `air/urban`
/// against `air`.
pub fn match_name_and_parent_context(
    sources: &mut [&mut NormalizedFlow],
    targets: &mut [NormalizedFlow],
    _: &RuleContext<'_>,
) -> Result<Vec<Match>> {
    let kind = RuleKind::NameAndParentContext;
    let index = index_targets(targets, |target| Some(name_key(&target.current)));
    let label = MatchLabel::new(kind.name(), kind.condition());
    let mut matches = Vec::new();
    let groups = group_sources(sources, |source| -> Option<NameKey> {
        let current = &source.current;
        let parent = current.context.parent()?;
        Some((
            current.name.as_str().to_string(),
            parent.segments().to_vec(),
            current.oxidation_state,
            location_key(current),
        ))
    });
    for (k, group) in groups {
        if let Some(candidates) = index.get(&k) {
            matches.extend(get_matches(group, candidates, label));
        }
    }
    Ok(matches)
}
