//! The `map` pipeline: load both flow lists, run the rules, write exports.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flowmap_map::{Flowmap, MatchingConfig};
use flowmap_model::{FlowIdAllocator, load_flows};
use flowmap_output::{
    FlowList, FlowmapExport, GladOptions, RandonneurOptions, write_flow_lists,
};
use tracing::{debug, info, info_span};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    All,
    Randonneur,
    Glad,
}

impl ExportFormat {
    fn randonneur(self) -> bool {
        matches!(self, ExportFormat::All | ExportFormat::Randonneur)
    }

    fn glad(self) -> bool {
        matches!(self, ExportFormat::All | ExportFormat::Glad)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rules: Vec<String>,
    pub regionalization_cutoff: Option<usize>,
    pub transitive_transformations: Option<PathBuf>,
    pub source_transformations: Vec<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: MatchingConfig) -> MatchingConfig {
        if !self.rules.is_empty() {
            config.rules = self.rules;
        }
        if let Some(cutoff) = self.regionalization_cutoff {
            config.regionalization_cutoff = cutoff;
        }
        if self.transitive_transformations.is_some() {
            config.transitive_transformations = self.transitive_transformations;
        }
        if !self.source_transformations.is_empty() {
            config.source_transformations = self.source_transformations;
        }
        config
    }
}

/// Loads the config file if given, then applies the overrides.
pub fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<MatchingConfig> {
    let config = match path {
        Some(path) => MatchingConfig::load(path)
            .with_context(|| format!("load matching config {}", path.display()))?,
        None => MatchingConfig::default(),
    };
    let config = overrides.apply(config);
    config.rule_kinds().context("validate rule list")?;
    Ok(config)
}

#[derive(Debug, Clone)]
pub struct MapRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    pub output_dir: PathBuf,
    pub format: ExportFormat,
    pub config: MatchingConfig,
    pub flow_lists: Vec<FlowList>,
    pub missing_source: bool,
}

#[derive(Debug)]
pub struct MapOutcome {
    pub source_id: String,
    pub target_id: String,
    pub flowmap: Flowmap,
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl MapOutcome {
    /// Source flows no rule matched.
    pub fn unmatched_sources(&self) -> usize {
        self.flowmap.unmatched_source().len()
    }
}

fn list_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flows".to_string())
}

pub fn run_map(request: &MapRequest) -> Result<MapOutcome> {
    let start = Instant::now();
    let source_id = list_id(&request.source);
    let target_id = list_id(&request.target);
    let span = info_span!("map", source = %source_id, target = %target_id);
    let _guard = span.enter();

    let ids = FlowIdAllocator::new();
    let sources = load_flows(&request.source, &ids)
        .with_context(|| format!("load source flows {}", request.source.display()))?;
    let targets = load_flows(&request.target, &ids)
        .with_context(|| format!("load target flows {}", request.target.display()))?;
    info!(sources = sources.len(), targets = targets.len(), "loaded flow lists");

    let rules = request.config.build_rules().context("build matching rules")?;
    debug!(rules = rules.len(), "built rule list");
    let mut flowmap = Flowmap::new(sources, targets, rules, ids).context("normalize flows")?;
    flowmap.generate_matches().context("generate matches")?;

    let stem = format!("{source_id}-{target_id}");
    let mut outputs = Vec::new();
    if request.format.randonneur() {
        let path = request.output_dir.join(format!("{stem}.json"));
        let options = RandonneurOptions::new(&source_id, &target_id);
        flowmap
            .to_randonneur(&options, Some(&path))
            .with_context(|| format!("write {}", path.display()))?;
        outputs.push(path);
    }
    if request.format.glad() {
        let path = request.output_dir.join(format!("{stem}-glad.csv"));
        let options = GladOptions {
            missing_source: request.missing_source,
            ensure_id: false,
        };
        flowmap
            .to_glad(options, Some(&path))
            .with_context(|| format!("write {}", path.display()))?;
        outputs.push(path);
    }
    if !request.flow_lists.is_empty() {
        outputs.extend(
            write_flow_lists(&flowmap, &request.output_dir, &stem, &request.flow_lists)
                .context("write flow lists")?,
        );
    }

    Ok(MapOutcome {
        source_id,
        target_id,
        flowmap,
        outputs,
        elapsed: start.elapsed(),
    })
}
