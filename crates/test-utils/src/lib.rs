pub mod builders;
pub mod mock_registry;

use std::sync::Once;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use dirwatch::{Event, WatchHandle};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Receive events until one matches `pred` or `timeout` elapses.
///
/// Returns the matching event plus everything skipped before it. Real
/// backends emit extra events (e.g. a modify after a create), so scenario
/// tests look for the event they care about rather than the first one.
pub fn recv_until<F>(
    handle: &WatchHandle,
    timeout: Duration,
    mut pred: F,
) -> Result<(Event, Vec<Event>), RecvTimeoutError>
where
    F: FnMut(&Event) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut skipped = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = handle.recv_timeout(remaining)?;
        if pred(&event) {
            return Ok((event, skipped));
        }
        skipped.push(event);
    }
}

/// Drain everything currently buffered without blocking.
pub fn drain(handle: &WatchHandle) -> Vec<Event> {
    std::iter::from_fn(|| handle.try_recv().ok()).collect()
}
