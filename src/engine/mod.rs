// src/engine/mod.rs

//! The notification engine seam.
//!
//! The registry never talks to the OS directly. It drives an [`Engine`], a
//! capability that can:
//! - start its own dispatch thread, calling back into a [`Dispatcher`] once
//!   per raw change,
//! - add a watch for a path (optionally recursive) and hand back an opaque
//!   [`WatchId`],
//! - remove a watch by identifier.
//!
//! Engine calls are only safe when serialized; the registry guarantees this
//! by calling them under its own lock.
//!
//! - [`lifecycle`] creates and starts the engine lazily, exactly once.
//! - [`notify_engine`] is the production engine built on `notify`.
//! - [`translate`] turns raw `notify` events into per-watch [`RawEvent`]s.
//! - [`mock`] is a scriptable engine for tests.

use std::path::Path;

use crate::errors::Result;
use crate::registry::Dispatcher;
use crate::types::WatchId;

pub mod lifecycle;
pub mod mock;
pub mod notify_engine;
pub mod translate;

pub use lifecycle::{EngineLifecycle, EngineState};
pub use notify_engine::NotifyEngine;

/// Raw action codes passed through the engine callback.
pub mod action {
    pub const ADD: i32 = 1;
    pub const DELETE: i32 = 2;
    pub const MODIFIED: i32 = 3;
    pub const MOVED: i32 = 4;
}

pub type RawAction = i32;

/// One change as reported by the engine's dispatch thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub watch_id: WatchId,
    pub directory: String,
    pub filename: String,
    pub action: RawAction,
    /// Only meaningful for moves.
    pub old_filename: String,
}

impl RawEvent {
    pub fn new(
        watch_id: WatchId,
        directory: impl Into<String>,
        filename: impl Into<String>,
        action: RawAction,
        old_filename: impl Into<String>,
    ) -> Self {
        Self {
            watch_id,
            directory: directory.into(),
            filename: filename.into(),
            action,
            old_filename: old_filename.into(),
        }
    }
}

/// Capability surface of the external notification engine.
pub trait Engine: Send {
    /// Register the callback and launch the dispatch thread.
    ///
    /// Called once, before any watch is added.
    fn start(&mut self, dispatcher: Dispatcher) -> Result<()>;

    /// Begin watching `path`. Fails if the path can't be watched.
    fn add_watch(&mut self, path: &Path, recursive: bool) -> Result<WatchId>;

    /// Stop watching. Unknown identifiers are an error.
    fn remove_watch(&mut self, id: WatchId) -> Result<()>;
}

/// Builds a fresh, not yet started engine.
pub type EngineFactory = Box<dyn Fn() -> Result<Box<dyn Engine>> + Send>;
