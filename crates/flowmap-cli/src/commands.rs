use anyhow::Result;
use comfy_table::{CellAlignment, Table};
use flowmap_cli::pipeline::{ConfigOverrides, MapOutcome, MapRequest, load_config, run_map};
use flowmap_map::RuleKind;
use flowmap_output::FlowList;

use crate::cli::MapArgs;
use crate::summary::{align_column, apply_table_style};

pub fn run_rules() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Rule", "Condition", "Default", "Description"]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for (position, kind) in RuleKind::ALL.into_iter().enumerate() {
        table.add_row(vec![
            (position + 1).to_string(),
            kind.name().to_string(),
            kind.condition().to_string(),
            if kind.is_default() { "yes" } else { "no" }.to_string(),
            kind.description().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Process status for a finished map run.
///
/// 0 on success; 2 when `fail_on_unmatched` is set and some source flow
/// was left without a match.
pub fn map_exit_status(outcome: &MapOutcome, fail_on_unmatched: bool) -> u8 {
    if fail_on_unmatched && outcome.unmatched_sources() > 0 {
        2
    } else {
        0
    }
}

pub fn run_map_command(args: MapArgs) -> Result<MapOutcome> {
    let overrides = ConfigOverrides {
        rules: args.rules,
        regionalization_cutoff: args.cutoff,
        transitive_transformations: args.transitive,
        source_transformations: args.transformations,
    };
    let config = load_config(args.config.as_deref(), overrides)?;

    let flow_lists = [
        (args.matched_source, FlowList::MatchedSource),
        (args.unmatched_source, FlowList::UnmatchedSource),
        (args.matched_target, FlowList::MatchedTarget),
        (args.unmatched_target, FlowList::UnmatchedTarget),
    ]
    .into_iter()
    .filter_map(|(wanted, list)| wanted.then_some(list))
    .collect();

    let request = MapRequest {
        source: args.source,
        target: args.target,
        output_dir: args.output_dir.unwrap_or_else(|| ".".into()),
        format: args.format.into(),
        config,
        flow_lists,
        missing_source: args.missing_source,
    };
    run_map(&request)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use serde_json::json;

    use super::*;
    use crate::cli::{Cli, Command};

    #[test]
    fn unmatched_sources_fail_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.json");
        let target = dir.path().join("target.json");
        let flows = json!([
            {"name": "Ammonia", "unit": "kg", "context": "air"},
            {"name": "Unobtainium", "unit": "kg", "context": "water"}
        ]);
        fs::write(&source, flows.to_string()).unwrap();
        fs::write(&target, json!([flows[0]]).to_string()).unwrap();

        let argv = [
            "flowmapper".to_string(),
            "map".to_string(),
            source.display().to_string(),
            target.display().to_string(),
            "--output-dir".to_string(),
            dir.path().display().to_string(),
            "--format".to_string(),
            "glad".to_string(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map command");
        };
        let outcome = run_map_command(args).unwrap();
        assert_eq!(outcome.flowmap.matches().len(), 1);
        assert_eq!(outcome.unmatched_sources(), 1);
        assert_eq!(map_exit_status(&outcome, false), 0);
        assert_eq!(map_exit_status(&outcome, true), 2);
    }
}
