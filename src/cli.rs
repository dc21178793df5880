// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::Mode;

/// Command-line arguments for `lifedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lifedag",
    version,
    about = "Run one phase of a lifecycle workflow (run, start, stop, cleanup).",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Which part of the lifecycle to run.
    #[arg(long, value_name = "MODE", default_value = "run")]
    pub mode: Mode,

    /// Turn on optional jobs matching this selector (job id, tag or glob).
    #[arg(long, value_name = "SELECTOR")]
    pub enable: Vec<String>,

    /// Turn off optional jobs matching this selector. Wins over `--enable`.
    #[arg(long, value_name = "SELECTOR")]
    pub disable: Vec<String>,

    /// Print the planned jobs before running them.
    #[arg(long)]
    pub list: bool,

    /// Plan and print, but don't execute any commands.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LIFEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
