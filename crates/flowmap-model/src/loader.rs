//! Flow-list loading.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::flow::{Flow, FlowRecord};
use crate::ids::FlowIdAllocator;

/// Loads a JSON array of flow records from `path`.
pub fn load_flows(path: &Path, ids: &FlowIdAllocator) -> Result<Vec<Flow>> {
    let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let flows = parse_flows(&text, &path.display().to_string(), ids)?;
    debug!(path = %path.display(), flows = flows.len(), "loaded flow list");
    Ok(flows)
}

/// Parses a JSON array of flow records.
///
/// The first record that fails validation aborts parsing with its index.
pub fn flows_from_json(text: &str, ids: &FlowIdAllocator) -> Result<Vec<Flow>> {
    parse_flows(text, "<inline>", ids)
}

fn parse_flows(text: &str, origin: &str, ids: &FlowIdAllocator) -> Result<Vec<Flow>> {
    let records: Vec<FlowRecord> =
        serde_json::from_str(text).map_err(|source| ModelError::Parse {
            origin: origin.to_string(),
            source,
        })?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Flow::from_record(record, ids).map_err(|source| ModelError::InvalidFlowRecord {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Serializes flows back into the flat record layout they were loaded from.
pub fn flows_to_json<'a>(flows: impl IntoIterator<Item = &'a Flow>) -> serde_json::Result<String> {
    let records: Vec<FlowRecord> = flows.into_iter().map(Flow::to_record).collect();
    serde_json::to_string_pretty(&records)
}
