use std::fmt;

/// Opaque identifier issued by the notification engine for a live watch.
///
/// Identifiers are unique among the watches currently registered with one
/// engine instance and are never handed out twice while still in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    pub const fn new(raw: u64) -> Self {
        WatchId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for WatchId {
    fn from(raw: u64) -> Self {
        WatchId(raw)
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
