#![allow(dead_code)]

use dirwatch::config::{ConfigFile, ConfigSection, RawConfigFile, WatchConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_watch(mut self, watch: WatchConfig) -> Self {
        self.config.watch.push(watch);
        self
    }

    pub fn with_default_buffer_size(mut self, size: usize) -> Self {
        self.config.config.buffer_size = size;
        self
    }

    pub fn with_default_recursive(mut self, recursive: bool) -> Self {
        self.config.config.recursive = recursive;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatchConfig`.
pub struct WatchConfigBuilder {
    watch: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            watch: WatchConfig::new(path),
        }
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.watch.recursive = Some(val);
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.watch.buffer_size = Some(size);
        self
    }

    pub fn build(self) -> WatchConfig {
        self.watch
    }
}
