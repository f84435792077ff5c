// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Default queue capacity per watch.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Configuration exactly as read from TOML.
///
/// ```toml
/// [config]
/// buffer_size = 10
/// recursive = true
///
/// [[watch]]
/// path = "src"
/// recursive = false
/// buffer_size = 100
/// ```
///
/// All sections are optional; validation happens in the conversion to
/// [`ConfigFile`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Defaults from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Every `[[watch]]` entry, in file order.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// `[config]` section: defaults applied to watches that don't override them.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Queue capacity for each watch.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether watches include subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_recursive() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            recursive: default_recursive(),
        }
    }
}

/// One `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub path: PathBuf,

    /// Overrides `config.recursive`.
    #[serde(default)]
    pub recursive: Option<bool>,

    /// Overrides `config.buffer_size`.
    #[serde(default)]
    pub buffer_size: Option<usize>,
}

impl WatchConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: None,
            buffer_size: None,
        }
    }
}

/// A watch with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    pub path: PathBuf,
    pub recursive: bool,
    pub buffer_size: usize,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub watch: Vec<WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, watch: Vec<WatchConfig>) -> Self {
        Self { config, watch }
    }

    /// Resolved watch list, in file order.
    pub fn watches(&self) -> Vec<WatchSpec> {
        self.watch
            .iter()
            .map(|w| WatchSpec {
                path: w.path.clone(),
                recursive: w.recursive.unwrap_or(self.config.recursive),
                buffer_size: w.buffer_size.unwrap_or(self.config.buffer_size),
            })
            .collect()
    }
}
