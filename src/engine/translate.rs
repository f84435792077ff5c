// src/engine/translate.rs

//! Turning raw `notify` events into per-watch [`RawEvent`]s.
//!
//! Two steps:
//! 1. [`Translator::translate`] classifies each `notify::Event` into
//!    [`Change`]s, pairing the halves of a rename into a single move.
//! 2. [`resolve`] fans each change out to every watch root that covers it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::engine::{RawEvent, action};
use crate::types::WatchId;

/// How long the first half of a rename waits for its second half before
/// being reported as a deletion.
pub const RENAME_PAIRING_WINDOW: Duration = Duration::from_millis(250);

/// A filesystem change, independent of which watches see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Add(PathBuf),
    Delete(PathBuf),
    Modified(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

/// Root directory of one watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchRoot {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }

    /// Does a change to `path` belong to this watch?
    ///
    /// Recursive roots cover everything strictly below them; non-recursive
    /// roots only their direct children.
    pub fn covers(&self, path: &Path) -> bool {
        if self.recursive {
            path != self.path && path.starts_with(&self.path)
        } else {
            path.parent() == Some(self.path.as_path())
        }
    }
}

/// Stateful classifier for raw `notify` events.
///
/// Keeps the pending halves of renames keyed by the backend's tracker
/// (the inotify cookie).
#[derive(Debug, Default)]
pub struct Translator {
    /// `From` halves still waiting for their `To`.
    pending_from: HashMap<usize, (PathBuf, Instant)>,
    /// Trackers already reported as a move through a `To` half; a trailing
    /// `Both` for them is a duplicate.
    completed: HashMap<usize, Instant>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_from.is_empty()
    }

    pub fn translate(&mut self, event: notify::Event, now: Instant) -> Vec<Change> {
        let tracker = event.tracker();
        match event.kind {
            EventKind::Create(_) => event.paths.into_iter().map(Change::Add).collect(),
            EventKind::Remove(_) => event.paths.into_iter().map(Change::Delete).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => {
                self.rename(mode, tracker, event.paths, now)
            }
            EventKind::Modify(_) | EventKind::Any => {
                event.paths.into_iter().map(Change::Modified).collect()
            }
            EventKind::Access(_) | EventKind::Other => Vec::new(),
        }
    }

    /// Report rename halves that never found a partner as deletions, in the
    /// order they were seen.
    pub fn expire(&mut self, now: Instant) -> Vec<Change> {
        let mut expired: Vec<(usize, Instant)> = self
            .pending_from
            .iter()
            .filter(|(_, (_, seen))| now.duration_since(*seen) >= RENAME_PAIRING_WINDOW)
            .map(|(tracker, (_, seen))| (*tracker, *seen))
            .collect();
        expired.sort_by_key(|(_, seen)| *seen);

        self.completed
            .retain(|_, seen| now.duration_since(*seen) < RENAME_PAIRING_WINDOW);

        expired
            .into_iter()
            .filter_map(|(tracker, _)| self.pending_from.remove(&tracker))
            .map(|(path, _)| Change::Delete(path))
            .collect()
    }

    fn rename(
        &mut self,
        mode: RenameMode,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        now: Instant,
    ) -> Vec<Change> {
        match mode {
            RenameMode::Both => {
                if let Some(tracker) = tracker {
                    self.pending_from.remove(&tracker);
                    if self.completed.remove(&tracker).is_some() {
                        return Vec::new();
                    }
                }
                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => vec![Change::Moved { from, to }],
                    (Some(path), None) => vec![Change::Modified(path)],
                    _ => Vec::new(),
                }
            }
            RenameMode::From => match tracker {
                Some(tracker) => {
                    if let Some(path) = paths.into_iter().next() {
                        self.pending_from.insert(tracker, (path, now));
                    }
                    Vec::new()
                }
                None => paths.into_iter().map(Change::Delete).collect(),
            },
            RenameMode::To => {
                let paired = tracker.and_then(|t| self.pending_from.remove(&t).map(|p| (t, p)));
                match (paired, paths.into_iter().next()) {
                    (Some((tracker, (from, _))), Some(to)) => {
                        self.completed.insert(tracker, now);
                        vec![Change::Moved { from, to }]
                    }
                    (None, Some(to)) => vec![Change::Add(to)],
                    (Some((_, (from, _))), None) => vec![Change::Delete(from)],
                    (None, None) => Vec::new(),
                }
            }
            // Backends that can't tell the halves apart (FSEvents) report
            // each side separately; existence decides which side this is.
            RenameMode::Any | RenameMode::Other => paths
                .into_iter()
                .map(|path| {
                    if path.exists() {
                        Change::Add(path)
                    } else {
                        Change::Delete(path)
                    }
                })
                .collect(),
        }
    }
}

/// Fan changes out to the watches that cover them.
///
/// Per watch, output order follows input order. A move that crosses a
/// watch's boundary is seen by that watch as an add or a delete; one that
/// changes directory inside a watch is seen as a delete then an add.
pub fn resolve(changes: &[Change], roots: &BTreeMap<WatchId, WatchRoot>) -> Vec<RawEvent> {
    let mut out = Vec::new();

    for change in changes {
        for (&id, root) in roots {
            let raw = match change {
                Change::Add(path) if root.covers(path) => raw_event(id, path, action::ADD, None),
                Change::Delete(path) if root.covers(path) => {
                    raw_event(id, path, action::DELETE, None)
                }
                Change::Modified(path) if root.covers(path) => {
                    raw_event(id, path, action::MODIFIED, None)
                }
                Change::Moved { from, to } => match (root.covers(from), root.covers(to)) {
                    (true, true) if from.parent() == to.parent() => {
                        raw_event(id, to, action::MOVED, Some(from.as_path()))
                    }
                    // An event carries one directory, so a move between
                    // directories is reported as its two halves.
                    (true, true) => {
                        out.extend(raw_event(id, from, action::DELETE, None));
                        raw_event(id, to, action::ADD, None)
                    }
                    (false, true) => raw_event(id, to, action::ADD, None),
                    (true, false) => raw_event(id, from, action::DELETE, None),
                    (false, false) => None,
                },
                _ => None,
            };
            out.extend(raw);
        }
    }

    out
}

fn raw_event(id: WatchId, path: &Path, action: i32, old: Option<&Path>) -> Option<RawEvent> {
    let directory = path.parent()?.to_string_lossy().into_owned();
    let filename = path.file_name()?.to_string_lossy().into_owned();
    let old_filename = old
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Some(RawEvent::new(id, directory, filename, action, old_filename))
}
