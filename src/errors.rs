// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::WatchId;

#[derive(Error, Debug)]
pub enum DirwatchError {
    /// The engine refused to create a watch (bad path, permissions,
    /// resource exhaustion). No registry entry exists for it.
    #[error("Failed to create watch on {path}: {reason}")]
    CreationFailure { path: String, reason: String },

    /// The identifier is not (or no longer) registered.
    #[error("Unknown watch: {0}")]
    UnknownWatch(WatchId),

    #[error("Notification engine has not been started")]
    EngineNotStarted,

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DirwatchError {
    pub(crate) fn creation_failure(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        DirwatchError::CreationFailure {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DirwatchError>;
