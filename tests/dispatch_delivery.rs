// tests/dispatch_delivery.rs

use std::error::Error;
use std::thread;
use std::time::Duration;

use dirwatch::engine::action;
use dirwatch::{DispatchOutcome, Event, EventType, WatchRegistry};
use dirwatch_test_utils::mock_registry::mock_registry;
use dirwatch_test_utils::{drain, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn created_file_arrives_as_add_event() -> TestResult {
    init_tracing();
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 10)?;

    engine.emit(watch.id(), "/D", "a.txt", action::ADD, "");

    assert_eq!(
        watch.recv(),
        Some(Event {
            directory: "/D".to_string(),
            filename: "a.txt".to_string(),
            kind: EventType::Add,
            old_filename: String::new(),
        })
    );
    Ok(())
}

#[test]
fn rename_arrives_as_moved_with_old_name() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 10)?;

    engine.emit(watch.id(), "/D", "b.txt", action::MOVED, "a.txt");

    let event = watch.recv().ok_or("no event")?;
    assert_eq!(event.kind, EventType::Moved);
    assert_eq!(event.filename, "b.txt");
    assert_eq!(event.old_filename, "a.txt");
    Ok(())
}

#[test]
fn old_filename_is_cleared_for_non_moves() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 10)?;

    engine.emit(watch.id(), "/D", "a.txt", action::MODIFIED, "stale");

    assert_eq!(watch.recv().ok_or("no event")?.old_filename, "");
    Ok(())
}

#[test]
fn up_to_capacity_is_kept_in_dispatch_order() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 5)?;

    for i in 0..5 {
        let outcome = engine.emit(watch.id(), "/D", &format!("f{i}"), action::MODIFIED, "");
        assert_eq!(outcome, DispatchOutcome::Delivered);
    }

    let names: Vec<String> = drain(&watch).into_iter().map(|e| e.filename).collect();
    assert_eq!(names, vec!["f0", "f1", "f2", "f3", "f4"]);
    Ok(())
}

#[test]
fn overflow_keeps_first_n_and_counts_drops() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 3)?;

    let outcomes: Vec<DispatchOutcome> = (0..7)
        .map(|i| engine.emit(watch.id(), "/D", &format!("f{i}"), action::ADD, ""))
        .collect();

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == DispatchOutcome::QueueFull)
            .count(),
        4
    );

    let names: Vec<String> = drain(&watch).into_iter().map(|e| e.filename).collect();
    assert_eq!(names, vec!["f0", "f1", "f2"]);
    assert_eq!(watch.delivered_events(), 3);
    assert_eq!(watch.dropped_events(), 4);
    Ok(())
}

#[test]
fn draining_frees_capacity_again() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 1)?;

    assert_eq!(engine.emit(watch.id(), "/D", "a", action::ADD, ""), DispatchOutcome::Delivered);
    assert_eq!(engine.emit(watch.id(), "/D", "b", action::ADD, ""), DispatchOutcome::QueueFull);
    assert_eq!(watch.recv().map(|e| e.filename), Some("a".to_string()));
    assert_eq!(engine.emit(watch.id(), "/D", "c", action::ADD, ""), DispatchOutcome::Delivered);
    assert_eq!(watch.recv().map(|e| e.filename), Some("c".to_string()));
    Ok(())
}

#[test]
fn events_after_delete_are_discarded_and_queue_closes() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 10)?;

    engine.emit(watch.id(), "/D", "before", action::ADD, "");
    registry.delete_watch(&watch)?;
    let late = engine.emit(watch.id(), "/D", "after", action::ADD, "");

    assert_eq!(late, DispatchOutcome::UnknownWatch);
    assert_eq!(watch.recv().map(|e| e.filename), Some("before".to_string()));
    assert_eq!(watch.recv(), None);
    Ok(())
}

#[test]
fn unknown_action_code_is_dropped() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 10)?;

    assert_eq!(
        engine.emit(watch.id(), "/D", "a", 99, ""),
        DispatchOutcome::UnknownAction
    );
    assert!(watch.is_empty());
    assert_eq!(watch.dropped_events(), 0);
    Ok(())
}

#[test]
fn events_stay_on_their_own_watch() -> TestResult {
    let (registry, engine) = mock_registry();
    let one = registry.create_watch("/one", true, 10)?;
    let two = registry.create_watch("/two", true, 10)?;

    engine.emit(one.id(), "/one", "x", action::ADD, "");
    engine.emit(two.id(), "/two", "y", action::DELETE, "");
    engine.emit(one.id(), "/one", "z", action::MODIFIED, "");

    let one_events: Vec<(EventType, String)> =
        drain(&one).into_iter().map(|e| (e.kind, e.filename)).collect();
    let two_events: Vec<(EventType, String)> =
        drain(&two).into_iter().map(|e| (e.kind, e.filename)).collect();

    assert_eq!(
        one_events,
        vec![
            (EventType::Add, "x".to_string()),
            (EventType::Modified, "z".to_string())
        ]
    );
    assert_eq!(two_events, vec![(EventType::Delete, "y".to_string())]);
    Ok(())
}

#[test]
fn full_queue_does_not_affect_other_watches() -> TestResult {
    let (registry, engine) = mock_registry();
    let stalled = registry.create_watch("/slow", true, 1)?;
    let healthy = registry.create_watch("/fast", true, 100)?;

    for i in 0..50 {
        engine.emit(stalled.id(), "/slow", &format!("s{i}"), action::MODIFIED, "");
        engine.emit(healthy.id(), "/fast", &format!("h{i}"), action::MODIFIED, "");
    }

    assert_eq!(stalled.len(), 1);
    assert_eq!(stalled.dropped_events(), 49);
    assert_eq!(healthy.len(), 50);
    assert_eq!(healthy.dropped_events(), 0);
    Ok(())
}

#[test]
fn zero_capacity_delivers_only_to_a_waiting_reader() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 0)?;

    assert_eq!(
        engine.emit(watch.id(), "/D", "nobody-listening", action::ADD, ""),
        DispatchOutcome::QueueFull
    );

    let reader = {
        let watch = watch.clone();
        thread::spawn(move || watch.recv_timeout(Duration::from_secs(5)).ok())
    };

    // Keep offering until the reader is parked in recv.
    let mut delivered = false;
    for _ in 0..500 {
        if engine.emit(watch.id(), "/D", "caught", action::ADD, "") == DispatchOutcome::Delivered {
            delivered = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    assert!(delivered);
    let received = reader.join().map_err(|_| "reader panicked")?;
    assert_eq!(received.map(|e| e.filename), Some("caught".to_string()));
    Ok(())
}

#[test]
fn dropped_readers_count_as_drops() -> TestResult {
    let (registry, engine) = mock_registry();
    let watch = registry.create_watch("/D", true, 4)?;
    let id = watch.id();
    let probe = registry.clone();
    drop(watch);

    assert_eq!(engine.emit(id, "/D", "a", action::ADD, ""), DispatchOutcome::Disconnected);
    assert!(probe.is_active(id));
    Ok(())
}

#[test]
fn dispatcher_outliving_registry_is_harmless() -> TestResult {
    let engine = dirwatch::engine::mock::MockEngine::new();
    let registry = WatchRegistry::new(engine.factory());
    let watch = registry.create_watch("/D", true, 4)?;
    let dispatcher = registry.dispatcher();

    drop(registry);

    assert!(!dispatcher.is_attached());
    assert_eq!(
        dispatcher.dispatch_raw(watch.id(), "/D", "a", action::ADD, ""),
        DispatchOutcome::RegistryDropped
    );
    // Registry state (and with it every sender) is gone, so the queue is closed.
    assert_eq!(watch.recv(), None);
    Ok(())
}
