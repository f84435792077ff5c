// src/config/mod.rs

//! Configuration for the `dirwatch` binary.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: turning a raw config into a validated [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, DEFAULT_BUFFER_SIZE, RawConfigFile, WatchConfig, WatchSpec,
};
