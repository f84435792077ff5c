use dirwatch::engine::mock::MockEngine;
use dirwatch::WatchRegistry;

/// A registry wired to a fresh [`MockEngine`], plus the engine to drive it.
pub fn mock_registry() -> (WatchRegistry, MockEngine) {
    let engine = MockEngine::new();
    let registry = WatchRegistry::new(engine.factory());
    (registry, engine)
}
