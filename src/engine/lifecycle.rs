// src/engine/lifecycle.rs

//! Lazy, once-only engine creation.
//!
//! The engine moves `Uninitialized -> Running` on the first watch creation
//! and never goes back. If creating or starting it fails, the state stays
//! `Uninitialized` and the next watch creation tries again.

use tracing::{debug, info};

use crate::engine::{Engine, EngineFactory};
use crate::errors::Result;
use crate::registry::Dispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running,
}

/// Owns the engine factory and, once started, the engine itself.
///
/// Not synchronized on its own: it lives inside the registry state and is
/// only touched under the registry lock.
pub struct EngineLifecycle {
    factory: EngineFactory,
    engine: Option<Box<dyn Engine>>,
}

impl EngineLifecycle {
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory,
            engine: None,
        }
    }

    pub fn state(&self) -> EngineState {
        match self.engine {
            Some(_) => EngineState::Running,
            None => EngineState::Uninitialized,
        }
    }

    /// Return the running engine, creating and starting it first if needed.
    pub fn ensure_running(&mut self, dispatcher: &Dispatcher) -> Result<&mut dyn Engine> {
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => self.start_engine(dispatcher)?,
        };
        Ok(self.engine.insert(engine).as_mut())
    }

    /// The engine, if it has been started.
    pub fn running(&mut self) -> Option<&mut dyn Engine> {
        match self.engine {
            Some(ref mut engine) => Some(engine.as_mut()),
            None => None,
        }
    }

    fn start_engine(&self, dispatcher: &Dispatcher) -> Result<Box<dyn Engine>> {
        debug!("creating notification engine");
        let mut engine = (self.factory)()?;
        engine.start(dispatcher.clone())?;
        info!("notification engine started");
        Ok(engine)
    }
}

impl std::fmt::Debug for EngineLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLifecycle")
            .field("state", &self.state())
            .finish()
    }
}
