// src/engine/notify_engine.rs

//! Production engine built on `notify`'s recommended platform watcher.
//!
//! A single `RecommendedWatcher` serves every watch. Its callback runs on
//! notify's own thread and only forwards raw events into a channel; the
//! engine's dispatch thread drains that channel, pairs renames, resolves
//! each change to the watches that cover it and hands the result to the
//! [`Dispatcher`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::engine::translate::{Translator, WatchRoot, resolve};
use crate::errors::{DirwatchError, Result};
use crate::registry::Dispatcher;
use crate::types::WatchId;

/// How often the dispatch thread wakes up to expire unpaired renames.
const TICK: Duration = Duration::from_millis(50);

type RawNotifyEvent = notify::Result<notify::Event>;

pub struct NotifyEngine {
    watcher: RecommendedWatcher,
    /// Taken by `start`.
    raw_rx: Option<Receiver<RawNotifyEvent>>,
    /// Shared with the dispatch thread for resolving events to watches.
    roots: Arc<Mutex<BTreeMap<WatchId, WatchRoot>>>,
    /// OS-level watches currently installed, by path.
    installed: HashMap<PathBuf, RecursiveMode>,
    next_id: u64,
    dispatch_thread: Option<JoinHandle<()>>,
}

impl NotifyEngine {
    /// Create the engine. Nothing is delivered until [`Engine::start`].
    pub fn new() -> Result<Self> {
        let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<RawNotifyEvent>();

        // Runs on notify's thread; must not block.
        let watcher = RecommendedWatcher::new(
            move |res: RawNotifyEvent| {
                // The receiver only goes away with the engine itself.
                let _ = raw_tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            raw_rx: Some(raw_rx),
            roots: Arc::new(Mutex::new(BTreeMap::new())),
            installed: HashMap::new(),
            next_id: 1,
            dispatch_thread: None,
        })
    }

    pub fn is_started(&self) -> bool {
        self.dispatch_thread.is_some()
    }

    /// Bring the installed OS watches in line with the registered roots.
    ///
    /// A root covered by a recursive ancestor root is not installed on its
    /// own. Stale watches are removed before new ones are added, since
    /// removing a nested inotify watch also tears down the descriptor an
    /// ancestor's recursive watch shares with it.
    fn reconcile(&mut self) -> Result<()> {
        let desired = desired_watches(&self.roots.lock());

        let stale: Vec<PathBuf> = self
            .installed
            .iter()
            .filter(|(path, mode)| desired.get(*path) != Some(*mode))
            .map(|(path, _)| path.clone())
            .collect();

        for path in stale {
            self.installed.remove(&path);
            if let Err(err) = self.watcher.unwatch(&path) {
                // Already gone (e.g. the directory was deleted).
                debug!(path = %path.display(), error = %err, "unwatch failed");
            }
        }

        for (path, mode) in desired {
            if self.installed.contains_key(&path) {
                continue;
            }
            self.watcher.watch(&path, mode)?;
            self.installed.insert(path, mode);
        }

        Ok(())
    }
}

impl Engine for NotifyEngine {
    fn start(&mut self, dispatcher: Dispatcher) -> Result<()> {
        let raw_rx = self.raw_rx.take().ok_or_else(|| {
            DirwatchError::Other(anyhow::anyhow!("notification engine already started"))
        })?;
        let roots = Arc::clone(&self.roots);

        let handle = thread::Builder::new()
            .name("dirwatch-dispatch".to_string())
            .spawn(move || dispatch_loop(raw_rx, roots, dispatcher))?;

        self.dispatch_thread = Some(handle);
        info!("dispatch thread started");
        Ok(())
    }

    fn add_watch(&mut self, path: &Path, recursive: bool) -> Result<WatchId> {
        if !self.is_started() {
            return Err(DirwatchError::EngineNotStarted);
        }

        let canonical = path.canonicalize()?;
        if !canonical.is_dir() {
            return Err(DirwatchError::creation_failure(path, "not a directory"));
        }

        let id = WatchId::new(self.next_id);
        self.next_id += 1;

        self.roots
            .lock()
            .insert(id, WatchRoot::new(canonical.clone(), recursive));

        if let Err(err) = self.reconcile() {
            self.roots.lock().remove(&id);
            if let Err(rollback) = self.reconcile() {
                warn!(error = %rollback, "failed to restore watches after failed add");
            }
            return Err(err);
        }

        debug!(watch = %id, path = %canonical.display(), recursive, "os watch registered");
        Ok(id)
    }

    fn remove_watch(&mut self, id: WatchId) -> Result<()> {
        if self.roots.lock().remove(&id).is_none() {
            return Err(DirwatchError::UnknownWatch(id));
        }
        self.reconcile()
    }
}

impl std::fmt::Debug for NotifyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyEngine")
            .field("started", &self.is_started())
            .field("installed", &self.installed.len())
            .finish()
    }
}

/// Minimal set of OS watches covering every root.
fn desired_watches(roots: &BTreeMap<WatchId, WatchRoot>) -> HashMap<PathBuf, RecursiveMode> {
    let recursive: Vec<&Path> = roots
        .values()
        .filter(|root| root.recursive)
        .map(|root| root.path.as_path())
        .collect();

    let mut desired: HashMap<PathBuf, RecursiveMode> = HashMap::new();
    for root in roots.values() {
        let covered_by_ancestor = recursive
            .iter()
            .any(|ancestor| *ancestor != root.path && root.path.starts_with(ancestor));
        if covered_by_ancestor {
            continue;
        }

        let mode = if root.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        desired
            .entry(root.path.clone())
            .and_modify(|existing| {
                if mode == RecursiveMode::Recursive {
                    *existing = RecursiveMode::Recursive;
                }
            })
            .or_insert(mode);
    }
    desired
}

/// Body of the dispatch thread. Exits once the watcher (and with it the
/// raw sender) is dropped.
fn dispatch_loop(
    raw_rx: Receiver<RawNotifyEvent>,
    roots: Arc<Mutex<BTreeMap<WatchId, WatchRoot>>>,
    dispatcher: Dispatcher,
) {
    let mut translator = Translator::new();

    loop {
        let received = raw_rx.recv_timeout(TICK);
        let now = Instant::now();

        // Expired rename halves happened before whatever just arrived.
        let mut changes = translator.expire(now);
        match received {
            Ok(Ok(event)) => changes.extend(translator.translate(event, now)),
            Ok(Err(err)) => warn!(error = %err, "file watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if changes.is_empty() {
            continue;
        }

        // Resolve under the roots lock, dispatch after releasing it: the
        // dispatcher takes the registry lock, which is held around our
        // add/remove calls.
        let raw_events = resolve(&changes, &roots.lock());
        for raw in raw_events {
            dispatcher.dispatch(raw);
        }
    }

    debug!("dispatch thread finished");
}
