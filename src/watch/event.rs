// src/watch/event.rs

//! The value delivered to consumers for every observed filesystem change.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::action;

/// Kind of change reported for an entry.
///
/// Discriminants match the raw action codes used by the engine callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Add = 1,
    Delete = 2,
    Modified = 3,
    Moved = 4,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Add,
        EventType::Delete,
        EventType::Modified,
        EventType::Moved,
    ];

    /// Human-readable name ("add", "delete", "modified", "moved").
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Add => "add",
            EventType::Delete => "delete",
            EventType::Modified => "modified",
            EventType::Moved => "moved",
        }
    }

    /// Raw action code as passed through the engine callback.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for EventType {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            action::ADD => Ok(EventType::Add),
            action::DELETE => Ok(EventType::Delete),
            action::MODIFIED => Ok(EventType::Modified),
            action::MOVED => Ok(EventType::Moved),
            other => Err(other),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(EventType::Add),
            "delete" => Ok(EventType::Delete),
            "modified" => Ok(EventType::Modified),
            "moved" => Ok(EventType::Moved),
            other => Err(format!(
                "invalid event type: {other} (expected \"add\", \"delete\", \"modified\" or \"moved\")"
            )),
        }
    }
}

/// One filesystem change, fully built before it is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Directory containing the affected entry.
    pub directory: String,
    /// Name of the affected entry.
    pub filename: String,
    pub kind: EventType,
    /// Previous name for `Moved` events, empty otherwise.
    pub old_filename: String,
}

impl Event {
    pub fn new(
        directory: impl Into<String>,
        filename: impl Into<String>,
        kind: EventType,
        old_filename: impl Into<String>,
    ) -> Self {
        let old_filename = match kind {
            EventType::Moved => old_filename.into(),
            _ => String::new(),
        };
        Self {
            directory: directory.into(),
            filename: filename.into(),
            kind,
            old_filename,
        }
    }

    /// Full path of the affected entry.
    pub fn path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.filename)
    }

    /// Full path the entry had before a move.
    pub fn old_path(&self) -> Option<PathBuf> {
        match self.kind {
            EventType::Moved if !self.old_filename.is_empty() => {
                Some(Path::new(&self.directory).join(&self.old_filename))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {} (formerly {}) in {}",
            self.kind, self.filename, self.old_filename, self.directory
        )
    }
}
