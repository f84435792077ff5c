// src/registry/dispatch.rs

//! Entry point called by the engine's dispatch thread for every raw change.
//!
//! Delivery never blocks: the dispatch thread is shared by every watch, so a
//! slow consumer loses events on its own queue instead of stalling the rest.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::engine::{RawAction, RawEvent};
use crate::registry::RegistryState;
use crate::types::WatchId;
use crate::watch::event::{Event, EventType};
use crate::watch::handle::EnqueueResult;

/// What happened to a single dispatched event.
///
/// Only `Delivered` puts anything on a queue; every other outcome is a
/// silent drop from the consumer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// The watch's queue was at capacity.
    QueueFull,
    /// Every reader of the watch's queue has been dropped.
    Disconnected,
    /// No live watch has this identifier (never created, or already deleted).
    UnknownWatch,
    /// The raw action code has no `EventType`.
    UnknownAction,
    /// The registry this dispatcher belonged to no longer exists.
    RegistryDropped,
}

/// Handle given to the engine on start.
///
/// Holds only a weak reference so a running engine never keeps its own
/// registry alive.
#[derive(Clone)]
pub struct Dispatcher {
    state: Weak<Mutex<RegistryState>>,
}

impl Dispatcher {
    pub(crate) fn new(state: &Arc<Mutex<RegistryState>>) -> Self {
        Self {
            state: Arc::downgrade(state),
        }
    }

    /// Resolve the watch and enqueue the event if there is room.
    ///
    /// Takes the registry lock for the lookup and the enqueue, so it can't
    /// interleave with watch creation or deletion.
    pub fn dispatch(&self, raw: RawEvent) -> DispatchOutcome {
        let Some(state) = self.state.upgrade() else {
            trace!(watch = %raw.watch_id, "registry dropped; discarding event");
            return DispatchOutcome::RegistryDropped;
        };

        let guard = state.lock();
        deliver(&guard, raw)
    }

    /// Convenience wrapper taking the callback's individual fields.
    pub fn dispatch_raw(
        &self,
        watch_id: WatchId,
        directory: &str,
        filename: &str,
        action: RawAction,
        old_filename: &str,
    ) -> DispatchOutcome {
        self.dispatch(RawEvent::new(
            watch_id,
            directory,
            filename,
            action,
            old_filename,
        ))
    }

    /// False once the owning registry has been dropped.
    pub fn is_attached(&self) -> bool {
        self.state.strong_count() > 0
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("attached", &self.is_attached())
            .finish()
    }
}

fn deliver(state: &RegistryState, raw: RawEvent) -> DispatchOutcome {
    // The watch may have been deleted before this event reached the
    // dispatch thread.
    let Some(queue) = state.queues.get(&raw.watch_id) else {
        trace!(watch = %raw.watch_id, filename = %raw.filename, "no live watch; discarding event");
        return DispatchOutcome::UnknownWatch;
    };

    let kind = match EventType::try_from(raw.action) {
        Ok(kind) => kind,
        Err(code) => {
            trace!(watch = %raw.watch_id, code, "unmapped action code; discarding event");
            return DispatchOutcome::UnknownAction;
        }
    };

    let event = Event::new(raw.directory, raw.filename, kind, raw.old_filename);

    match queue.try_enqueue(event) {
        EnqueueResult::Queued => DispatchOutcome::Delivered,
        EnqueueResult::Full => {
            trace!(watch = %raw.watch_id, "queue full; dropping event");
            DispatchOutcome::QueueFull
        }
        EnqueueResult::Disconnected => {
            trace!(watch = %raw.watch_id, "no readers left; dropping event");
            DispatchOutcome::Disconnected
        }
    }
}
