//! GLAD flow-mapping table output.

use std::io::Write;
use std::path::Path;

use flowmap_map::Flowmap;
use flowmap_model::{Flow, Match};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::common::ensure_parent_dir;
use crate::error::{OutputError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GladOptions {
    /// Add a row with empty target fields for every unmatched source flow.
    pub missing_source: bool,
    /// Fill empty flow UUIDs with fresh random ones.
    pub ensure_id: bool,
}

/// One row of the table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GladRow {
    pub source_flow_name: String,
    #[serde(rename = "SourceFlowUUID")]
    pub source_flow_uuid: String,
    pub source_flow_context: String,
    pub source_unit: String,
    pub match_condition: String,
    pub conversion_factor: Option<f64>,
    pub target_flow_name: String,
    #[serde(rename = "TargetFlowUUID")]
    pub target_flow_uuid: String,
    pub target_flow_context: String,
    pub target_unit: String,
    pub memo_mapper: String,
}

pub const GLAD_COLUMNS: [&str; 11] = [
    "SourceFlowName",
    "SourceFlowUUID",
    "SourceFlowContext",
    "SourceUnit",
    "MatchCondition",
    "ConversionFactor",
    "TargetFlowName",
    "TargetFlowUUID",
    "TargetFlowContext",
    "TargetUnit",
    "MemoMapper",
];

fn flow_uuid(flow: &Flow, ensure_id: bool) -> String {
    match flow.identifier.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ if ensure_id => Uuid::new_v4().to_string(),
        _ => String::new(),
    }
}

fn source_row(flow: &Flow, options: GladOptions) -> GladRow {
    GladRow {
        source_flow_name: flow.name.to_string(),
        source_flow_uuid: flow_uuid(flow, options.ensure_id),
        source_flow_context: flow.context.export_as_string("/"),
        source_unit: flow.unit.to_string(),
        ..GladRow::default()
    }
}

fn match_row(found: &Match, options: GladOptions) -> GladRow {
    let target = &found.target;
    GladRow {
        match_condition: found.condition.as_glad().to_string(),
        conversion_factor: Some(found.conversion_factor),
        target_flow_name: target.name.to_string(),
        target_flow_uuid: flow_uuid(target, options.ensure_id),
        target_flow_context: target.context.export_as_string("/"),
        target_unit: target.unit.to_string(),
        memo_mapper: found.comment.clone(),
        ..source_row(&found.source, options)
    }
}

/// One row per match, then optionally one per unmatched source flow.
pub fn build_glad_rows(flowmap: &Flowmap, options: GladOptions) -> Vec<GladRow> {
    let mut rows: Vec<GladRow> = flowmap
        .matches()
        .iter()
        .map(|found| match_row(found, options))
        .collect();
    if options.missing_source {
        rows.extend(
            flowmap
                .unmatched_source()
                .into_iter()
                .map(|flow| source_row(flow, options)),
        );
    }
    rows
}

pub fn write_glad_to<W: Write>(writer: W, rows: &[GladRow]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv.write_record(GLAD_COLUMNS)?;
    }
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_glad(path: &Path, rows: &[GladRow]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path).map_err(|source| OutputError::io(path, source))?;
    write_glad_to(file, rows).map_err(|source| OutputError::csv(path, source))?;
    info!(path = %path.display(), rows = rows.len(), "wrote GLAD table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use flowmap_model::{FlowIdAllocator, FlowRecord, MatchCondition};

    use super::*;

    fn flow(ids: &FlowIdAllocator, name: &str, identifier: Option<&str>) -> Flow {
        let mut record = FlowRecord::new(name, "kg", serde_json::json!(["air", "urban"]));
        if let Some(identifier) = identifier {
            record = record.with_identifier(identifier);
        }
        Flow::from_record(record, ids).unwrap()
    }

    #[test]
    fn header_matches_columns() {
        let mut buffer = Vec::new();
        write_glad_to(&mut buffer, &[GladRow::default()]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().next().unwrap(), GLAD_COLUMNS.join(","));
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut buffer = Vec::new();
        write_glad_to(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim_end(), GLAD_COLUMNS.join(","));
    }

    #[test]
    fn match_row_fields() {
        let ids = FlowIdAllocator::new();
        let found = Match::new(
            flow(&ids, "Lead", None),
            flow(&ids, "Lead", Some("t-1")),
            "match_identical_names",
            MatchCondition::Close,
        )
        .with_conversion_factor(0.001)
        .with_comment("checked");

        let plain = match_row(&found, GladOptions::default());
        assert_eq!(plain.source_flow_uuid, "");
        assert_eq!(plain.source_flow_context, "air/urban");
        assert_eq!(plain.match_condition, "~");
        assert_eq!(plain.conversion_factor, Some(0.001));
        assert_eq!(plain.target_flow_uuid, "t-1");
        assert_eq!(plain.memo_mapper, "checked");

        let filled = match_row(
            &found,
            GladOptions {
                ensure_id: true,
                ..GladOptions::default()
            },
        );
        assert!(Uuid::parse_str(&filled.source_flow_uuid).is_ok());
        assert_eq!(filled.target_flow_uuid, "t-1");
    }
}
