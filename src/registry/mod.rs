// src/registry/mod.rs

//! Watch registry: maps live watch identifiers to their event queues.
//!
//! One lock guards both the identifier map and the engine. Creation,
//! deletion and every dispatch lookup take it for their whole critical
//! section (engine calls included), which gives:
//! - a new watch's queue is in the map before its identifier is visible to
//!   anyone, so no event for it is lost as "unknown";
//! - after `delete_watch` returns, no dispatch can find the identifier and
//!   the queue is closed exactly once;
//! - the engine is only ever called from one thread at a time.
//!
//! There is a single dispatch thread, so the coarse lock costs nothing in
//! parallelism. Several dispatch threads would call for a read/write lock
//! or a sharded map, keeping deletion and lookup of the same identifier
//! mutually exclusive.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::engine::{Engine, EngineLifecycle, EngineState, NotifyEngine};
use crate::errors::{DirwatchError, Result};
use crate::types::WatchId;
use crate::watch::handle::{EventQueue, WatchHandle};

pub mod dispatch;

pub use dispatch::{DispatchOutcome, Dispatcher};

/// State behind the registry lock.
pub(crate) struct RegistryState {
    engine: EngineLifecycle,
    queues: HashMap<WatchId, EventQueue>,
}

/// Process-level watch registry.
///
/// Construct one and share it (it is cheap to clone; clones share state).
/// Tests can build as many independent registries as they like.
#[derive(Clone)]
pub struct WatchRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl WatchRegistry {
    /// Create a registry whose engine is built by `factory` on first use.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Engine>> + Send + 'static,
    {
        let state = RegistryState {
            engine: EngineLifecycle::new(Box::new(factory)),
            queues: HashMap::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Registry backed by the platform's native watcher.
    pub fn with_notify() -> Self {
        Self::new(|| Ok(Box::new(NotifyEngine::new()?) as Box<dyn Engine>))
    }

    /// Start watching `path` and return the handle to read its events from.
    ///
    /// `buffer_size` is the queue capacity. Events arriving while the queue
    /// is full are dropped; with `0`, an event is only delivered if a reader
    /// is blocked in `recv` at that moment.
    ///
    /// The first call starts the engine. On failure nothing is registered.
    ///
    /// Event directories are reported as the engine resolves them. The
    /// notify engine canonicalizes `path`, so events for a watch created
    /// through a symlink or a relative path carry the resolved absolute
    /// directory, not the string passed here.
    pub fn create_watch(
        &self,
        path: impl AsRef<Path>,
        recursive: bool,
        buffer_size: usize,
    ) -> Result<WatchHandle> {
        let path = path.as_ref();
        let dispatcher = self.dispatcher();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let engine = state
            .engine
            .ensure_running(&dispatcher)
            .map_err(|err| DirwatchError::creation_failure(path, err))?;

        // Any event the engine raises for this id before the insert below
        // waits on the lock we are holding.
        let id = engine
            .add_watch(path, recursive)
            .map_err(|err| DirwatchError::creation_failure(path, err))?;

        if state.queues.contains_key(&id) {
            error!(watch = %id, path = %path.display(), "engine reissued a live watch id");
            return Err(DirwatchError::creation_failure(
                path,
                format!("engine returned identifier {id} which is already in use"),
            ));
        }

        let (queue, handle) = EventQueue::with_capacity(id, buffer_size);
        state.queues.insert(id, queue);

        debug!(
            watch = %id,
            path = %path.display(),
            recursive,
            buffer_size,
            "watch created"
        );
        Ok(handle)
    }

    /// Stop a watch and close its queue.
    ///
    /// Deleting a watch that is not registered (including a second delete of
    /// the same handle) returns [`DirwatchError::UnknownWatch`] and changes
    /// nothing. If the engine rejects the removal the watch is still
    /// unregistered and its queue closed, and `UnknownWatch` is returned.
    pub fn delete_watch(&self, handle: &WatchHandle) -> Result<()> {
        let id = handle.id();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.queues.contains_key(&id) {
            debug!(watch = %id, "delete of unknown watch ignored");
            return Err(DirwatchError::UnknownWatch(id));
        }

        let removed = match state.engine.running() {
            Some(engine) => engine.remove_watch(id),
            None => Err(DirwatchError::EngineNotStarted),
        };

        // Out of the map first, then closed: no dispatch can reach the
        // sender once it is gone from the map.
        if let Some(queue) = state.queues.remove(&id) {
            queue.close();
        }

        match removed {
            Ok(()) => {
                debug!(watch = %id, dropped = handle.dropped_events(), "watch deleted");
                Ok(())
            }
            Err(err) => {
                warn!(watch = %id, error = %err, "engine rejected watch removal");
                Err(DirwatchError::UnknownWatch(id))
            }
        }
    }

    /// Entry point for the engine's dispatch thread.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(&self.state)
    }

    /// Number of watches currently registered.
    pub fn active_watches(&self) -> usize {
        self.state.lock().queues.len()
    }

    pub fn is_active(&self, id: WatchId) -> bool {
        self.state.lock().queues.contains_key(&id)
    }

    pub fn engine_state(&self) -> EngineState {
        self.state.lock().engine.state()
    }
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WatchRegistry")
            .field("engine", &state.engine)
            .field("active_watches", &state.queues.len())
            .finish()
    }
}
