//! Temporary rewrites of the flows rules compare.
//!
//! Some rules compare flows after passing them through a migration table.
//! The rewrite goes into each flow's `current` form only, and a
//! [`TransformationScope`] resets every flow it was given when it is dropped,
//! on every exit path.

use std::collections::HashMap;

use flowmap_model::{ContextField, FlowUpdate, NormalizedFlow, StringField, UnitField};
use flowmap_standards::{MigrationRecord, MigrationTable};
use tracing::debug;

/// Rewrites the `current` form of one flow.
pub type Transform<'t> = dyn Fn(&mut NormalizedFlow) + 't;

/// Guard that applies transforms on entry and resets flows on drop.
///
/// Nested scopes over the same flows reset to the canonical normalized
/// form, not to the state of the enclosing scope.
pub struct TransformationScope<'a, 'f> {
    sources: &'a mut [&'f mut NormalizedFlow],
    targets: &'a mut [NormalizedFlow],
}

impl<'a, 'f> TransformationScope<'a, 'f> {
    /// Applies `transforms` in order to every source and every target.
    pub fn enter(
        sources: &'a mut [&'f mut NormalizedFlow],
        targets: &'a mut [NormalizedFlow],
        transforms: &[&Transform<'_>],
    ) -> Self {
        let mut scope = Self { sources, targets };
        for transform in transforms {
            for flow in scope.sources.iter_mut() {
                transform(&mut **flow);
            }
            for flow in scope.targets.iter_mut() {
                transform(flow);
            }
        }
        scope
    }

    pub fn flows(&mut self) -> (&mut [&'f mut NormalizedFlow], &mut [NormalizedFlow]) {
        (&mut *self.sources, &mut *self.targets)
    }
}

impl Drop for TransformationScope<'_, '_> {
    fn drop(&mut self) {
        for flow in self.sources.iter_mut() {
            flow.reset_current();
        }
        for flow in self.targets.iter_mut() {
            flow.reset_current();
        }
    }
}

/// Selector of a migration record, brought into normalized form once.
#[derive(Debug)]
struct Selector {
    name: Option<String>,
    unit: Option<UnitField>,
    context: Option<Vec<String>>,
    location: Option<String>,
}

/// A migration table prepared for lookups against normalized flows.
///
/// Records are indexed by normalized source name; records without a name
/// selector are tried for every flow. The first record, in table order,
/// whose every selector field matches wins.
#[derive(Debug)]
pub struct Migration {
    name: String,
    case_insensitive: bool,
    selectors: Vec<Option<Selector>>,
    records: Vec<MigrationRecord>,
    by_name: HashMap<String, Vec<usize>>,
    unnamed: Vec<usize>,
}

impl Migration {
    pub fn new(table: MigrationTable) -> Self {
        let selectors: Vec<Option<Selector>> = table
            .records
            .iter()
            .map(|record| {
                let context = match &record.source.context {
                    Some(value) => match ContextField::from_json(value) {
                        Ok(context) => Some(context.normalize().segments().to_vec()),
                        Err(_) => return None,
                    },
                    None => None,
                };
                Some(Selector {
                    name: record
                        .source
                        .name
                        .as_deref()
                        .map(|name| StringField::from(name).normalize().to_string()),
                    unit: record.source.unit.as_deref().map(UnitField::new),
                    context,
                    location: record.source.location.clone(),
                })
            })
            .collect();
        let unusable = selectors.iter().filter(|s| s.is_none()).count();
        if unusable > 0 {
            debug!(
                table = %table.name,
                records = unusable,
                "skipping migration records with unsupported context selectors"
            );
        }

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut unnamed = Vec::new();
        for (idx, selector) in selectors.iter().enumerate() {
            match selector {
                Some(Selector {
                    name: Some(name), ..
                }) => by_name.entry(name.clone()).or_default().push(idx),
                Some(_) => unnamed.push(idx),
                None => {}
            }
        }

        Self {
            name: table.name,
            case_insensitive: table.case_insensitive,
            selectors,
            records: table.records,
            by_name,
            unnamed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first record applying to the flow's current form.
    pub fn find(&self, flow: &NormalizedFlow) -> Option<&MigrationRecord> {
        let named = self
            .by_name
            .get(flow.current.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut candidates: Vec<usize> = named.iter().chain(&self.unnamed).copied().collect();
        candidates.sort_unstable();
        candidates
            .into_iter()
            .find(|&idx| self.selects(idx, flow))
            .map(|idx| &self.records[idx])
    }

    fn selects(&self, idx: usize, flow: &NormalizedFlow) -> bool {
        let Some(selector) = &self.selectors[idx] else {
            return false;
        };
        let current = &flow.current;
        if let Some(unit) = &selector.unit
            && *unit != current.unit
        {
            return false;
        }
        if let Some(context) = &selector.context
            && context.as_slice() != current.context.segments()
        {
            return false;
        }
        if let Some(location) = &selector.location {
            let Some(current_location) = &current.location else {
                return false;
            };
            let same = if self.case_insensitive {
                location.eq_ignore_ascii_case(current_location)
            } else {
                location == current_location
            };
            if !same {
                return false;
            }
        }
        true
    }

    /// Rewrites the flow's current form with the first applicable record.
    ///
    /// The rewrite is merged with overrides already in force, and a record's
    /// conversion factor multiplies the flow's current one.
    pub fn apply(&self, flow: &mut NormalizedFlow) {
        let Some(record) = self.find(flow) else {
            return;
        };
        let target = &record.target;
        let update = FlowUpdate {
            name: target.name.as_deref().map(StringField::from),
            unit: target.unit.as_deref().map(UnitField::new),
            context: target
                .context
                .as_ref()
                .and_then(|value| ContextField::from_json(value).ok()),
            location: target.location.clone(),
            oxidation_state: None,
            conversion_factor: record
                .conversion_factor
                .map(|factor| factor * flow.current.conversion_factor.unwrap_or(1.0)),
        };
        let merged = flow.overrides().merge(&update);
        flow.update_current(merged);
    }
}

#[cfg(test)]
mod tests {
    use flowmap_model::{Flow, FlowIdAllocator, FlowRecord};
    use flowmap_standards::MigrationFields;
    use serde_json::json;

    use super::*;

    fn flow(ids: &FlowIdAllocator, name: &str, unit: &str, context: &str) -> NormalizedFlow {
        let flow = Flow::from_record(FlowRecord::new(name, unit, context), ids).unwrap();
        NormalizedFlow::from_flow(flow, ids).unwrap()
    }

    fn record(
        source: MigrationFields,
        target: MigrationFields,
        factor: Option<f64>,
    ) -> MigrationRecord {
        MigrationRecord {
            source,
            target,
            conversion_factor: factor,
        }
    }

    fn fields(name: &str) -> MigrationFields {
        MigrationFields {
            name: Some(name.to_string()),
            ..MigrationFields::default()
        }
    }

    #[test]
    fn first_matching_record_wins() {
        let table = MigrationTable::new(
            "t",
            vec![
                record(
                    MigrationFields {
                        context: Some(json!(["water"])),
                        ..fields("Carbon dioxide")
                    },
                    fields("wrong"),
                    None,
                ),
                record(fields("carbon dioxide"), fields("Carbon dioxide, fossil"), Some(2.0)),
                record(fields("Carbon dioxide"), fields("also wrong"), None),
            ],
        );
        let migration = Migration::new(table);
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Carbon Dioxide", "kg", "air");
        migration.apply(&mut source);
        assert_eq!(source.current.name.as_str(), "carbon dioxide, fossil");
        assert_eq!(source.current.conversion_factor, Some(2.0));
        assert_eq!(source.normalized.name.as_str(), "carbon dioxide");
    }

    #[test]
    fn stacked_tables_merge_overrides() {
        let ids = FlowIdAllocator::new();
        let mut source = flow(&ids, "Methane", "kg", "air");
        let first = Migration::new(MigrationTable::new(
            "first",
            vec![record(
                fields("methane"),
                MigrationFields {
                    context: Some(json!("air/urban")),
                    ..fields("Methane, fossil")
                },
                Some(2.0),
            )],
        ));
        let second = Migration::new(MigrationTable::new(
            "second",
            vec![record(fields("methane, fossil"), fields("Methane, fossil, biogenic"), Some(3.0))],
        ));
        first.apply(&mut source);
        second.apply(&mut source);
        assert_eq!(source.current.name.as_str(), "methane, fossil, biogenic");
        assert_eq!(source.current.context.segments(), ["air", "urban"]);
        assert_eq!(source.current.conversion_factor, Some(6.0));
    }

    #[test]
    fn scope_resets_on_drop() {
        let ids = FlowIdAllocator::new();
        let mut a = flow(&ids, "Methane", "kg", "air");
        let mut targets = vec![flow(&ids, "Methane", "kg", "air")];
        let rename = |flow: &mut NormalizedFlow| {
            flow.update_current(FlowUpdate {
                name: Some(StringField::from("ch4")),
                ..FlowUpdate::default()
            });
        };
        {
            let mut sources = vec![&mut a];
            let mut scope = TransformationScope::enter(&mut sources, &mut targets, &[&rename]);
            let (sources, targets) = scope.flows();
            assert_eq!(sources[0].current.name.as_str(), "ch4");
            assert_eq!(targets[0].current.name.as_str(), "ch4");
        }
        assert_eq!(a.current.name.as_str(), "methane");
        assert_eq!(targets[0].current.name.as_str(), "methane");
    }

    #[test]
    fn nested_scope_resets_to_canonical() {
        let ids = FlowIdAllocator::new();
        let mut a = flow(&ids, "Methane", "kg", "air");
        let mut targets: Vec<NormalizedFlow> = Vec::new();
        let outer_rename = |flow: &mut NormalizedFlow| {
            flow.update_current(FlowUpdate {
                name: Some(StringField::from("outer")),
                ..FlowUpdate::default()
            });
        };
        let inner_rename = |flow: &mut NormalizedFlow| {
            flow.update_current(FlowUpdate {
                name: Some(StringField::from("inner")),
                ..FlowUpdate::default()
            });
        };
        let mut sources = vec![&mut a];
        let mut outer = TransformationScope::enter(&mut sources, &mut targets, &[&outer_rename]);
        {
            let (sources, targets) = outer.flows();
            let mut inner = TransformationScope::enter(sources, targets, &[&inner_rename]);
            assert_eq!(inner.flows().0[0].current.name.as_str(), "inner");
        }
        assert_eq!(outer.flows().0[0].current.name.as_str(), "methane");
    }

    #[test]
    fn scope_resets_on_panic() {
        let ids = FlowIdAllocator::new();
        let mut a = flow(&ids, "Methane", "kg", "air");
        let mut targets: Vec<NormalizedFlow> = Vec::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let rename = |flow: &mut NormalizedFlow| {
                flow.update_current(FlowUpdate {
                    name: Some(StringField::from("ch4")),
                    ..FlowUpdate::default()
                });
            };
            let mut sources = vec![&mut a];
            let _scope = TransformationScope::enter(&mut sources, &mut targets, &[&rename]);
            panic!("comparison failed");
        }));
        assert!(result.is_err());
        assert_eq!(a.current.name.as_str(), "methane");
    }
}
