// src/watch/mod.rs

//! Consumer-facing watch types.
//!
//! - [`event`] defines the immutable [`Event`] value and the four-valued
//!   [`EventType`].
//! - [`handle`] defines [`WatchHandle`], which pairs a watch identifier with
//!   its bounded event queue, plus the per-watch drop counters.

pub mod event;
pub mod handle;

pub use event::{Event, EventType};
pub use handle::{WatchHandle, WatchStats};
