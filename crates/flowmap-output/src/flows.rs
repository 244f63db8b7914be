//! Matched and unmatched flow lists, written back in the input shape.

use std::path::{Path, PathBuf};

use flowmap_map::Flowmap;
use flowmap_model::{Flow, flows_to_json};
use tracing::info;

use crate::common::write_text;
use crate::error::{OutputError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowList {
    MatchedSource,
    UnmatchedSource,
    MatchedTarget,
    UnmatchedTarget,
}

impl FlowList {
    pub const ALL: [FlowList; 4] = [
        FlowList::MatchedSource,
        FlowList::UnmatchedSource,
        FlowList::MatchedTarget,
        FlowList::UnmatchedTarget,
    ];

    /// File name suffix, e.g. `unmatched-source`.
    pub fn suffix(self) -> &'static str {
        match self {
            FlowList::MatchedSource => "matched-source",
            FlowList::UnmatchedSource => "unmatched-source",
            FlowList::MatchedTarget => "matched-target",
            FlowList::UnmatchedTarget => "unmatched-target",
        }
    }

    pub fn select(self, flowmap: &Flowmap) -> Vec<&Flow> {
        match self {
            FlowList::MatchedSource => flowmap.matched_source(),
            FlowList::UnmatchedSource => flowmap.unmatched_source(),
            FlowList::MatchedTarget => flowmap.matched_target(),
            FlowList::UnmatchedTarget => flowmap.unmatched_target(),
        }
    }
}

pub fn write_flows(path: &Path, flows: &[&Flow]) -> Result<()> {
    let text =
        flows_to_json(flows.iter().copied()).map_err(|source| OutputError::json(path, source))?;
    write_text(path, &text)
}

/// Writes each requested list to `{dir}/{stem}-{suffix}.json`.
pub fn write_flow_lists(
    flowmap: &Flowmap,
    dir: &Path,
    stem: &str,
    lists: &[FlowList],
) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::with_capacity(lists.len());
    for list in lists {
        let flows = list.select(flowmap);
        let path = dir.join(format!("{stem}-{}.json", list.suffix()));
        write_flows(&path, &flows)?;
        info!(path = %path.display(), flows = flows.len(), "wrote flow list");
        outputs.push(path);
    }
    Ok(outputs)
}
