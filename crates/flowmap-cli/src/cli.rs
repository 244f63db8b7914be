//! CLI argument definitions for `flowmapper`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use flowmap_cli::logging::LogFormat;
use flowmap_cli::pipeline::ExportFormat;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "flowmapper",
    version,
    about = "Map elementary flows between LCA flow lists",
    long_about = "Map elementary flows from a source flow list onto a target flow list.\n\n\
                  Matches are exported as a randonneur datapackage (JSON) and a GLAD\n\
                  flow-mapping table (CSV)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match a source flow list against a target flow list.
    Map(MapArgs),

    /// List the matching rules in their default order.
    Rules,
}

#[derive(Parser)]
pub struct MapArgs {
    /// Source flow list (JSON array of flow records).
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Target flow list (JSON array of flow records).
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Output directory for generated files (default: current directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Export format to generate.
    #[arg(long = "format", value_enum, default_value = "all")]
    pub format: OutputFormatArg,

    /// Matching configuration file (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rule to run, in order; repeat for several (replaces the configured list).
    #[arg(long = "rule", value_name = "NAME")]
    pub rules: Vec<String>,

    /// Minimum number of sibling targets before a regional flow is added.
    #[arg(long = "cutoff", value_name = "N")]
    pub cutoff: Option<usize>,

    /// Migration table applied to both lists by the transitive rule.
    #[arg(long = "transitive", value_name = "FILE")]
    pub transitive: Option<PathBuf>,

    /// Migration table applied to source flows; repeat to chain tables.
    #[arg(long = "transformations", value_name = "FILE")]
    pub transformations: Vec<PathBuf>,

    /// Write the source flows no rule matched.
    #[arg(long = "unmatched-source")]
    pub unmatched_source: bool,

    /// Write the target flows no source was matched to.
    #[arg(long = "unmatched-target")]
    pub unmatched_target: bool,

    /// Write the matched source flows.
    #[arg(long = "matched-source")]
    pub matched_source: bool,

    /// Write the matched target flows.
    #[arg(long = "matched-target")]
    pub matched_target: bool,

    /// Add unmatched source flows to the GLAD table with empty targets.
    #[arg(long = "missing-source")]
    pub missing_source: bool,

    /// Exit with status 2 when any source flow stays unmatched.
    #[arg(long = "fail-on-unmatched")]
    pub fail_on_unmatched: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    All,
    Randonneur,
    Glad,
}

impl From<OutputFormatArg> for ExportFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::All => ExportFormat::All,
            OutputFormatArg::Randonneur => ExportFormat::Randonneur,
            OutputFormatArg::Glad => ExportFormat::Glad,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn map_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "flowmapper",
            "map",
            "source.json",
            "target.json",
            "--rule",
            "identical_names",
            "--rule",
            "close_names",
            "--transformations",
            "a.json",
            "--transformations",
            "b.json",
            "--cutoff",
            "5",
            "--unmatched-source",
        ])
        .unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(args.rules, ["identical_names", "close_names"]);
        assert_eq!(args.transformations.len(), 2);
        assert_eq!(args.cutoff, Some(5));
        assert!(args.unmatched_source);
        assert!(!args.matched_target);
        assert!(matches!(args.format, OutputFormatArg::All));
        assert!(!args.fail_on_unmatched);
    }

    #[test]
    fn log_flags_convert() {
        let cli = Cli::try_parse_from([
            "flowmapper",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "rules",
        ])
        .unwrap();
        assert_eq!(cli.log_level.map(LevelFilter::from), Some(LevelFilter::DEBUG));
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Json);
        assert!(matches!(cli.command, Command::Rules));
    }
}
