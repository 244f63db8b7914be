//! `flowmapper` binary.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use flowmap_cli::logging::{LogConfig, init_logging};
use tracing::warn;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{map_exit_status, run_map_command, run_rules};
use crate::summary::print_summary;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run(cli.command) {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<u8> {
    match command {
        Command::Map(args) => {
            let fail_on_unmatched = args.fail_on_unmatched;
            let outcome = run_map_command(args)?;
            print_summary(&outcome);
            let status = map_exit_status(&outcome, fail_on_unmatched);
            if status != 0 {
                warn!(
                    unmatched = outcome.unmatched_sources(),
                    "source flows left unmatched"
                );
            }
            Ok(status)
        }
        Command::Rules => run_rules().map(|()| 0),
    }
}

/// Explicit `--log-level` wins over `-v`/`-q`; either disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = cli
        .log_level
        .map_or_else(|| cli.verbosity.tracing_level_filter(), Into::into);
    let ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    let mut config = LogConfig::default()
        .with_level_filter(level_filter)
        .with_format(cli.log_format.into())
        .with_ansi(ansi)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config
}
