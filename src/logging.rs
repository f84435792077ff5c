// src/logging.rs

//! Diagnostics for the `dirwatch` binary.
//!
//! STDOUT belongs to the event lines printed by each watch reader, so the
//! `tracing` subscriber writes to STDERR and `dirwatch . > events.log`
//! captures events only. The level comes from `--log-level`, then
//! `DIRWATCH_LOG`, then `info`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DIRWATCH_LOG";

/// Install the global subscriber. A second call fails instead of
/// replacing the first one.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = effective_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

// An unparseable env value falls through to the default.
fn effective_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(parse_env_level))
        .unwrap_or(Level::INFO)
}

fn parse_env_level(value: &str) -> Option<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(Level::WARN),
        other => other.parse().ok(),
    }
}
