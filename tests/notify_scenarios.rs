// tests/notify_scenarios.rs
//
// End-to-end runs against the platform watcher. Backends differ in how
// many events they report per operation, so each test waits for the event
// it cares about instead of asserting on the whole stream.

use std::fs;
use std::time::Duration;

use dirwatch::engine::EngineState;
use dirwatch::errors::DirwatchError;
use dirwatch::{EventType, WatchRegistry};
use dirwatch_test_utils::{init_tracing, recv_until};

const WAIT: Duration = Duration::from_secs(5);

// Give the backend a moment to arm the watch before touching files.
fn settle() {
    std::thread::sleep(Duration::from_millis(200));
}

#[test]
fn created_file_is_reported_as_add() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let registry = WatchRegistry::with_notify();

    let watch = registry.create_watch(&root, true, 64).unwrap();
    assert_eq!(registry.engine_state(), EngineState::Running);
    settle();

    fs::write(root.join("a.txt"), b"hello").unwrap();

    let (event, _) = recv_until(&watch, WAIT, |e| {
        e.kind == EventType::Add && e.filename == "a.txt"
    })
    .expect("add event for a.txt");
    assert_eq!(event.directory, root.to_string_lossy());
    assert_eq!(event.old_filename, "");

    registry.delete_watch(&watch).unwrap();
}

#[test]
fn removed_file_is_reported_as_delete() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("gone.txt"), b"x").unwrap();

    let registry = WatchRegistry::with_notify();
    let watch = registry.create_watch(&root, false, 64).unwrap();
    settle();

    fs::remove_file(root.join("gone.txt")).unwrap();

    recv_until(&watch, WAIT, |e| {
        e.kind == EventType::Delete && e.filename == "gone.txt"
    })
    .expect("delete event for gone.txt");
}

#[cfg(target_os = "linux")]
#[test]
fn rename_within_directory_is_reported_as_moved() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("a.txt"), b"x").unwrap();

    let registry = WatchRegistry::with_notify();
    let watch = registry.create_watch(&root, true, 64).unwrap();
    settle();

    fs::rename(root.join("a.txt"), root.join("b.txt")).unwrap();

    let (event, _) = recv_until(&watch, WAIT, |e| e.kind == EventType::Moved)
        .expect("moved event");
    assert_eq!(event.filename, "b.txt");
    assert_eq!(event.old_filename, "a.txt");
}

#[test]
fn non_recursive_watch_ignores_nested_changes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir(root.join("sub")).unwrap();

    let registry = WatchRegistry::with_notify();
    let shallow = registry.create_watch(&root, false, 64).unwrap();
    let deep = registry.create_watch(&root, true, 64).unwrap();
    settle();

    fs::write(root.join("sub").join("inner.txt"), b"x").unwrap();
    fs::write(root.join("top.txt"), b"x").unwrap();

    recv_until(&deep, WAIT, |e| e.filename == "inner.txt").expect("nested event on deep watch");
    let (_, skipped) =
        recv_until(&shallow, WAIT, |e| e.filename == "top.txt").expect("top-level event");
    assert!(skipped.iter().all(|e| e.filename != "inner.txt"));
}

#[test]
fn deleted_watch_stops_receiving() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let registry = WatchRegistry::with_notify();
    let watch = registry.create_watch(&root, true, 64).unwrap();
    settle();
    registry.delete_watch(&watch).unwrap();

    fs::write(root.join("after.txt"), b"x").unwrap();

    // Closed and empty: end-of-stream right away.
    assert_eq!(watch.recv(), None);
    assert!(!registry.is_active(watch.id()));
}

#[test]
fn missing_directory_is_creation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let registry = WatchRegistry::with_notify();

    let err = registry
        .create_watch(dir.path().join("does-not-exist"), true, 4)
        .unwrap_err();
    assert!(matches!(err, DirwatchError::CreationFailure { .. }));
    assert_eq!(registry.active_watches(), 0);
}

#[test]
fn regular_file_is_creation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();
    let registry = WatchRegistry::with_notify();

    let err = registry.create_watch(&file, true, 4).unwrap_err();
    assert!(matches!(err, DirwatchError::CreationFailure { reason, .. } if reason.contains("not a directory")));
}

#[cfg(unix)]
#[test]
fn events_report_the_canonical_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap().join("real");
    fs::create_dir(&target).unwrap();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let registry = WatchRegistry::with_notify();
    let watch = registry.create_watch(&link, true, 64).unwrap();
    settle();

    fs::write(target.join("c.txt"), b"x").unwrap();

    let (event, _) = recv_until(&watch, WAIT, |e| e.filename == "c.txt").expect("event for c.txt");
    assert_eq!(event.directory, target.to_string_lossy());
    assert_ne!(event.directory, link.to_string_lossy());
}
