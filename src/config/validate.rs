// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DirwatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DirwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_watches(cfg)?;
    validate_paths(cfg)?;
    Ok(())
}

fn ensure_has_watches(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.is_empty() {
        return Err(DirwatchError::ConfigError(
            "config must contain at least one [[watch]] entry".to_string(),
        ));
    }
    Ok(())
}

// Existence is not checked here; the engine reports unusable paths when
// the watch is created.
fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashSet<&Path> = HashSet::new();
    for (index, watch) in cfg.watch.iter().enumerate() {
        if watch.path.as_os_str().is_empty() {
            return Err(DirwatchError::ConfigError(format!(
                "[[watch]] entry {} has an empty path",
                index + 1
            )));
        }
        if !seen.insert(watch.path.as_path()) {
            return Err(DirwatchError::ConfigError(format!(
                "duplicate watch path {:?}",
                watch.path
            )));
        }
    }
    Ok(())
}
