// src/watch/handle.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use crate::types::WatchId;
use crate::watch::event::Event;

/// Per-watch delivery counters.
///
/// Dropped events are never reported to the consumer through the queue;
/// these counters are the only place they show up.
#[derive(Debug, Default)]
pub struct WatchStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl WatchStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Result of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnqueueResult {
    Queued,
    Full,
    Disconnected,
}

/// Producer side of a watch's event queue. Owned by the registry only;
/// dropping it closes the queue.
#[derive(Debug)]
pub(crate) struct EventQueue {
    tx: Sender<Event>,
    stats: Arc<WatchStats>,
}

impl EventQueue {
    /// Allocate a bounded queue and the handle that reads from it.
    pub(crate) fn with_capacity(id: WatchId, capacity: usize) -> (Self, WatchHandle) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let stats = Arc::new(WatchStats::default());
        let queue = EventQueue {
            tx,
            stats: Arc::clone(&stats),
        };
        let handle = WatchHandle {
            id,
            events: rx,
            stats,
        };
        (queue, handle)
    }

    /// Enqueue without ever blocking the caller.
    pub(crate) fn try_enqueue(&self, event: Event) -> EnqueueResult {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                EnqueueResult::Queued
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                EnqueueResult::Full
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                EnqueueResult::Disconnected
            }
        }
    }

    /// Close the queue. Readers drain what is buffered, then see end-of-stream.
    pub(crate) fn close(self) {
        drop(self.tx);
    }
}

/// Consumer-facing side of a watch: its identifier plus the event queue.
///
/// Clones share the same queue and counters. Once the watch is deleted the
/// queue is closed: buffered events can still be read, after which every
/// receive reports end-of-stream.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    id: WatchId,
    events: Receiver<Event>,
    stats: Arc<WatchStats>,
}

impl WatchHandle {
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// The raw receiving end, for `select!` or iteration.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Block until an event arrives; `None` once the queue is closed and drained.
    pub fn recv(&self) -> Option<Event> {
        self.events.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<Event, TryRecvError> {
        self.events.try_recv()
    }

    /// Iterate until the queue is closed.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Event> {
        self.events.iter()
    }

    /// Fixed capacity chosen at creation time (`Some(0)` for a rendezvous queue).
    pub fn capacity(&self) -> Option<usize> {
        self.events.capacity()
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn delivered_events(&self) -> u64 {
        self.stats.delivered()
    }

    pub fn dropped_events(&self) -> u64 {
        self.stats.dropped()
    }

    pub fn stats(&self) -> &WatchStats {
        &self.stats
    }
}
