// src/engine/mock.rs

//! Scriptable in-memory engine.
//!
//! Clones share state, so a test keeps one `MockEngine` to drive and
//! inspect while the registry owns the boxed copies its factory produced.
//! [`MockEngine::emit`] plays the role of the engine's dispatch thread.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::engine::{Engine, RawAction, RawEvent};
use crate::errors::{DirwatchError, Result};
use crate::registry::{DispatchOutcome, Dispatcher};
use crate::types::WatchId;

#[derive(Debug, Default)]
struct MockState {
    dispatcher: Option<Dispatcher>,
    created: usize,
    started: usize,
    next_id: u64,
    watches: BTreeMap<WatchId, (PathBuf, bool)>,
    removed: Vec<WatchId>,
    failing_paths: HashSet<PathBuf>,
    fail_create: bool,
    reject_removals: bool,
    reuse_id: Option<WatchId>,
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.state.lock().next_id = 1;
        engine
    }

    /// Factory for [`crate::registry::WatchRegistry::new`].
    pub fn factory(&self) -> impl Fn() -> Result<Box<dyn Engine>> + Send + 'static {
        let engine = self.clone();
        move || {
            let mut state = engine.state.lock();
            if state.fail_create {
                return Err(DirwatchError::Other(anyhow!("mock engine creation refused")));
            }
            state.created += 1;
            drop(state);
            Ok(Box::new(engine.clone()) as Box<dyn Engine>)
        }
    }

    /// Make `add_watch` fail for this path.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state.lock().failing_paths.insert(path.into());
    }

    /// Make the factory fail (or succeed again).
    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().fail_create = fail;
    }

    /// Make `remove_watch` fail while still forgetting the watch.
    pub fn set_reject_removals(&self, reject: bool) {
        self.state.lock().reject_removals = reject;
    }

    /// Have the next `add_watch` hand out `id` instead of a fresh one.
    pub fn reuse_id_once(&self, id: WatchId) {
        self.state.lock().reuse_id = Some(id);
    }

    /// Deliver one raw event, as the dispatch thread would.
    ///
    /// Events for identifiers the engine no longer knows are still passed
    /// on, to mimic a callback already in flight when the watch went away.
    pub fn emit(
        &self,
        id: WatchId,
        directory: &str,
        filename: &str,
        action: RawAction,
        old_filename: &str,
    ) -> DispatchOutcome {
        // Clone out so the mock's lock isn't held while the registry lock
        // is taken.
        let dispatcher = self.state.lock().dispatcher.clone();
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch(RawEvent::new(
                id,
                directory,
                filename,
                action,
                old_filename,
            )),
            None => DispatchOutcome::RegistryDropped,
        }
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    pub fn started_count(&self) -> usize {
        self.state.lock().started
    }

    pub fn live_watches(&self) -> Vec<(WatchId, PathBuf, bool)> {
        self.state
            .lock()
            .watches
            .iter()
            .map(|(id, (path, recursive))| (*id, path.clone(), *recursive))
            .collect()
    }

    pub fn removed(&self) -> Vec<WatchId> {
        self.state.lock().removed.clone()
    }
}

impl Engine for MockEngine {
    fn start(&mut self, dispatcher: Dispatcher) -> Result<()> {
        let mut state = self.state.lock();
        state.started += 1;
        state.dispatcher = Some(dispatcher);
        Ok(())
    }

    fn add_watch(&mut self, path: &Path, recursive: bool) -> Result<WatchId> {
        let mut state = self.state.lock();
        if state.dispatcher.is_none() {
            return Err(DirwatchError::EngineNotStarted);
        }
        if state.failing_paths.contains(path) {
            return Err(DirwatchError::creation_failure(path, "mock refused path"));
        }

        let id = match state.reuse_id.take() {
            Some(id) => id,
            None => {
                let id = WatchId::new(state.next_id);
                state.next_id += 1;
                id
            }
        };
        state.watches.insert(id, (path.to_path_buf(), recursive));
        Ok(id)
    }

    fn remove_watch(&mut self, id: WatchId) -> Result<()> {
        let mut state = self.state.lock();
        let known = state.watches.remove(&id).is_some();
        state.removed.push(id);
        if !known || state.reject_removals {
            return Err(DirwatchError::UnknownWatch(id));
        }
        Ok(())
    }
}
