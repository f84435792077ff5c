// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_BUFFER_SIZE;

/// Command-line arguments for `dirwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dirwatch",
    version,
    about = "Print filesystem changes under one or more directories until Ctrl-C.",
    long_about = None
)]
pub struct CliArgs {
    /// Directories to watch.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Read additional watches from a TOML config file.
    ///
    /// Without PATH arguments, `Dirwatch.toml` in the current directory is
    /// read if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Queue capacity for each watch given on the command line.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer: usize,

    /// Only watch the top level of each command-line path.
    #[arg(long)]
    pub no_recursive: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DIRWATCH_LOG` or a default level will be used.
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

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
