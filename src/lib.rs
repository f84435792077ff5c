// src/lib.rs

//! Per-directory filesystem change streams.
//!
//! A [`WatchRegistry`] hands out [`WatchHandle`]s, each with its own bounded
//! queue of [`Event`]s, and routes the notification engine's callbacks to
//! the right queue without ever blocking the engine's dispatch thread. A
//! consumer that falls behind loses events on its own queue (counted in
//! [`WatchHandle::dropped_events`]); nothing else slows down. This is the
//! load-shedding contract, not a bug.
//!
//! ```no_run
//! use dirwatch::WatchRegistry;
//!
//! let registry = WatchRegistry::with_notify();
//! let watch = registry.create_watch("/tmp", true, 10)?;
//! if let Some(event) = watch.recv() {
//!     println!("{event}");
//! }
//! registry.delete_watch(&watch)?;
//! # Ok::<(), dirwatch::errors::DirwatchError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use registry::{DispatchOutcome, Dispatcher, WatchRegistry};
pub use types::WatchId;
pub use watch::{Event, EventType, WatchHandle};

use crate::cli::CliArgs;
use crate::config::WatchSpec;
use crate::config::loader::{default_config_path, load_and_validate};

/// High-level entry point used by `main.rs`.
///
/// Creates one watch per configured path, prints every event from a
/// reader per watch, and on Ctrl-C deletes all watches and waits for each
/// reader to see its queue close.
pub async fn run(args: CliArgs) -> Result<()> {
    let specs = collect_watch_specs(&args)?;
    let registry = WatchRegistry::with_notify();

    let mut watches = Vec::with_capacity(specs.len());
    for spec in specs {
        let handle = registry
            .create_watch(&spec.path, spec.recursive, spec.buffer_size)
            .with_context(|| format!("watching {:?}", spec.path))?;
        info!(
            watch = %handle.id(),
            path = %spec.path.display(),
            recursive = spec.recursive,
            buffer_size = spec.buffer_size,
            "watch started"
        );

        let reader = handle.clone();
        let path = spec.path.clone();
        let task = tokio::task::spawn_blocking(move || print_events(&path, &reader));
        watches.push((spec.path, handle, task));
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    println!("Received interrupt, shutting down watchers...");
    for (path, handle, _) in &watches {
        if let Err(err) = registry.delete_watch(handle) {
            warn!(path = %path.display(), error = %err, "failed to delete watch");
        }
    }

    for (path, handle, task) in watches {
        task.await.context("event reader panicked")?;
        if handle.dropped_events() > 0 {
            warn!(
                path = %path.display(),
                dropped = handle.dropped_events(),
                delivered = handle.delivered_events(),
                "events were dropped because the queue was full"
            );
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Watches from the config file (if any) followed by the command-line paths.
fn collect_watch_specs(args: &CliArgs) -> Result<Vec<WatchSpec>> {
    let mut specs = Vec::new();

    if let Some(config_path) = config_to_load(args, default_config_path()) {
        let cfg = load_and_validate(&config_path)
            .with_context(|| format!("loading config {:?}", config_path))?;
        let root = config_root_dir(&config_path);
        specs.extend(cfg.watches().into_iter().map(|mut spec| {
            if spec.path.is_relative() {
                spec.path = root.join(&spec.path);
            }
            spec
        }));
    }

    specs.extend(args.paths.iter().map(|path| WatchSpec {
        path: path.clone(),
        recursive: !args.no_recursive,
        buffer_size: args.buffer,
    }));

    if specs.is_empty() {
        anyhow::bail!(
            "nothing to watch: pass one or more PATH arguments, --config, or create {}",
            default_config_path().display()
        );
    }
    Ok(specs)
}

/// `--config` if given. Otherwise `fallback`, but only when no paths were
/// passed and the file exists.
fn config_to_load(args: &CliArgs, fallback: PathBuf) -> Option<PathBuf> {
    match &args.config {
        Some(path) => Some(path.clone()),
        None if args.paths.is_empty() && fallback.is_file() => Some(fallback),
        None => None,
    }
}

/// Relative paths in a config file are resolved against its directory.
///
/// A bare filename like "Dirwatch.toml" (parent = "") resolves against
/// the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_events(path: &Path, handle: &WatchHandle) {
    for event in handle.iter() {
        println!("{event}");
    }
    println!("Watcher for {} is finished", path.display());
}
