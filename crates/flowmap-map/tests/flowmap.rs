use std::fs;
use std::sync::{Arc, Mutex};

use flowmap_map::{Flowmap, MapError, MatchRule, MatchingConfig, RuleKind};
use flowmap_model::{Flow, FlowIdAllocator, FlowRecord, MatchCondition};
use proptest::prelude::*;

fn flow(ids: &FlowIdAllocator, record: FlowRecord) -> Flow {
    Flow::from_record(record, ids).unwrap()
}

fn default_flowmap(sources: Vec<Flow>, targets: Vec<Flow>, ids: FlowIdAllocator) -> Flowmap {
    let rules = MatchingConfig::default().build_rules().unwrap();
    Flowmap::new(sources, targets, rules, ids).unwrap()
}

#[test]
fn butanediol_end_to_end() {
    let ids = FlowIdAllocator::new();
    let source = flow(
        &ids,
        FlowRecord::new("1,4-Butanediol", "kg", "air").with_cas_number("110-63-4"),
    );
    let target = flow(
        &ids,
        FlowRecord::new("1,4-Butanediol", "kg", "air")
            .with_cas_number("110-63-4")
            .with_identifier("09db39be-a0b1-4b2c-8d3e-4f5a6b7c8d9e"),
    );
    let other = flow(&ids, FlowRecord::new("Butane", "kg", "air"));
    let mut flowmap = default_flowmap(vec![source], vec![target, other], ids);

    let matches = flowmap.generate_matches().unwrap();
    assert_eq!(matches.len(), 1);
    let found = &matches[0];
    assert_eq!(found.condition, MatchCondition::Exact);
    assert_eq!(found.conversion_factor, 1.0);
    assert_eq!(found.function_name, "match_identical_names");
    assert_eq!(
        found.target.identifier.as_deref(),
        Some("09db39be-a0b1-4b2c-8d3e-4f5a6b7c8d9e")
    );
}

#[test]
fn ambiguous_candidates_are_not_matched() {
    let ids = FlowIdAllocator::new();
    let source = flow(&ids, FlowRecord::new("Lead", "kg", "water"));
    let targets = vec![
        flow(&ids, FlowRecord::new("Lead", "kg", "water").with_identifier("a")),
        flow(&ids, FlowRecord::new("Lead", "kg", "water").with_identifier("b")),
    ];
    let mut flowmap = default_flowmap(vec![source], targets, ids);
    assert!(flowmap.generate_matches().unwrap().is_empty());
    assert_eq!(flowmap.unmatched_source().len(), 1);
}

#[test]
fn unit_conversion_factor_is_carried() {
    let ids = FlowIdAllocator::new();
    let source = flow(&ids, FlowRecord::new("Zinc", "g", "soil"));
    let targets = vec![
        flow(&ids, FlowRecord::new("Zinc", "kg", "soil")),
        flow(&ids, FlowRecord::new("Zinc", "m3", "soil")),
    ];
    let mut flowmap = default_flowmap(vec![source], targets, ids);
    let matches = flowmap.generate_matches().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].target.unit.as_str(), "kg");
    assert_eq!(matches[0].conversion_factor, 0.001);
}

#[test]
fn later_rules_only_see_unmatched_sources() {
    let ids = FlowIdAllocator::new();
    let sources = vec![
        flow(&ids, FlowRecord::new("Ammonia", "kg", "air")),
        flow(&ids, FlowRecord::new("Unobtainium", "kg", "air")),
    ];
    let targets = vec![flow(&ids, FlowRecord::new("Ammonia", "kg", "air"))];

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        MatchRule::new("record", MatchCondition::Related, move |sources, _, _| {
            let mut seen = seen.lock().unwrap();
            for source in sources.iter() {
                assert!(!source.matched);
                seen.push(source.original.name.to_string());
            }
            Ok(Vec::new())
        })
    };
    let rules = vec![
        MatchingConfig {
            rules: vec![RuleKind::IdenticalNames.name().to_string()],
            ..MatchingConfig::default()
        }
        .build_rules()
        .unwrap()
        .remove(0),
        recorder,
    ];
    let mut flowmap = Flowmap::new(sources, targets, rules, ids).unwrap();
    flowmap.generate_matches().unwrap();

    assert_eq!(*seen.lock().unwrap(), ["Unobtainium"]);
    let summaries = flowmap.rule_summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!((summaries[0].matches, summaries[0].unmatched_remaining), (1, 1));
    assert_eq!((summaries[1].matches, summaries[1].unmatched_remaining), (0, 1));
}

fn regional_run(siblings: &[&str]) -> Flowmap {
    let ids = FlowIdAllocator::new();
    let sources = vec![
        flow(&ids, FlowRecord::new("Ammonia, NL", "kg", "air")),
        flow(&ids, FlowRecord::new("Ammonia, BE", "kg", "air")),
    ];
    let targets = siblings
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            flow(
                &ids,
                FlowRecord::new(name, "kg", "air")
                    .with_identifier(&format!("sibling-{idx}")),
            )
        })
        .collect();
    let config = MatchingConfig {
        rules: vec![RuleKind::AddMissingRegionalizedFlows.name().to_string()],
        regionalization_cutoff: 3,
        ..MatchingConfig::default()
    };
    let rules = config.build_rules().unwrap();
    let mut flowmap = Flowmap::new(sources, targets, rules, ids).unwrap();
    flowmap.generate_matches().unwrap();
    flowmap
}

#[test]
fn regionalization_respects_cutoff() {
    let flowmap = regional_run(&["Ammonia, FR", "Ammonia, DE"]);
    assert!(flowmap.matches().is_empty());
    assert_eq!(flowmap.target_flows().len(), 2);
}

#[test]
fn regionalization_adds_one_flow_per_source() {
    let flowmap = regional_run(&["Ammonia, FR", "Ammonia, DE", "Ammonia, CH"]);
    let matches = flowmap.matches();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.new_target_flow));
    assert!(matches.iter().all(|m| m.condition == MatchCondition::Related));

    let names: Vec<&str> = matches.iter().map(|m| m.target.name.as_str()).collect();
    assert_eq!(names, ["Ammonia, NL", "Ammonia, BE"]);

    let identifiers: Vec<&str> = matches
        .iter()
        .filter_map(|m| m.target.identifier.as_deref())
        .collect();
    assert_eq!(identifiers.len(), 2);
    assert_ne!(identifiers[0], identifiers[1]);
    assert!(identifiers.iter().all(|id| !id.starts_with("sibling-")));

    assert_eq!(flowmap.target_flows().len(), 5);
}

#[test]
fn regionalization_cutoff_ignores_global_siblings() {
    let flowmap = regional_run(&["Ammonia, FR", "Ammonia, DE", "Ammonia"]);
    assert!(flowmap.matches().is_empty());
    assert_eq!(flowmap.target_flows().len(), 3);
}

#[test]
fn regionalization_extends_sole_global_sibling() {
    let flowmap = regional_run(&["Ammonia"]);
    let matches = flowmap.matches();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.new_target_flow));

    let names: Vec<&str> = matches.iter().map(|m| m.target.name.as_str()).collect();
    assert_eq!(names, ["Ammonia, NL", "Ammonia, BE"]);
    assert_eq!(flowmap.target_flows().len(), 3);
}

#[test]
fn source_transformations_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("simapro.json");
    fs::write(
        &table,
        r#"{
            "name": "simapro-renames",
            "update": [
                {"source": {"name": "Carbon dioxide, in air"},
                 "target": {"name": "Carbon dioxide, from air"},
                 "conversion_factor": 2.0}
            ]
        }"#,
    )
    .unwrap();
    let config_path = dir.path().join("flowmapper.toml");
    fs::write(
        &config_path,
        format!(
            "rules = [\"names_with_source_transformations\"]\nsource_transformations = ['{}']\n",
            table.display()
        ),
    )
    .unwrap();

    let config = MatchingConfig::load(&config_path).unwrap();
    assert_eq!(config.rule_kinds().unwrap(), [RuleKind::NamesWithSourceTransformations]);

    let ids = FlowIdAllocator::new();
    let context = "natural resource/in air";
    let sources = vec![flow(
        &ids,
        FlowRecord::new("Carbon dioxide, in air", "kg", context),
    )];
    let targets = vec![flow(
        &ids,
        FlowRecord::new("Carbon dioxide, from air", "kg", context),
    )];
    let rules = config.build_rules().unwrap();
    let mut flowmap = Flowmap::new(sources, targets, rules, ids).unwrap();
    let matches = flowmap.generate_matches().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].conversion_factor, 2.0);
    assert_eq!(matches[0].source.name.as_str(), "Carbon dioxide, in air");
    assert_eq!(
        flowmap.source_flows()[0].current.name.as_str(),
        "carbon dioxide, in air"
    );
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        MatchingConfig::load(&missing),
        Err(MapError::ConfigIo { path, .. }) if path == missing
    ));
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "rules = 3").unwrap();
    assert!(matches!(
        MatchingConfig::load(&path),
        Err(MapError::ConfigToml { .. })
    ));
}

proptest! {
    #[test]
    fn each_source_matched_at_most_once(names in prop::collection::vec("[a-d]{1,3}", 1..12)) {
        let ids = FlowIdAllocator::new();
        let sources: Vec<Flow> = names
            .iter()
            .map(|name| flow(&ids, FlowRecord::new(name, "kg", "air")))
            .collect();
        let targets: Vec<Flow> = names
            .iter()
            .rev()
            .map(|name| flow(&ids, FlowRecord::new(name, "kg", "air")))
            .collect();
        let mut flowmap = default_flowmap(sources, targets, ids);
        let matches = flowmap.generate_matches().unwrap();

        let mut seen = std::collections::HashSet::new();
        for found in matches {
            prop_assert!(seen.insert(found.source.id()));
        }
        prop_assert_eq!(
            flowmap.matched_source().len() + flowmap.unmatched_source().len(),
            names.len()
        );
    }
}
