//! Shared application state for the control-plane server.

use std::sync::{Arc, Mutex};

use palay_engine::Engine;

/// One engine instance shared between the HTTP handlers and the drive
/// task. The engine is the sole mutator of simulation state; the mutex
/// serializes control commands with time progression.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<Engine>>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}
