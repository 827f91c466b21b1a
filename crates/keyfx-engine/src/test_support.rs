//! Test support utilities for keyfx-engine unit and integration tests.
//! Nothing here touches the OS.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

pub use crate::sim::{SimPhysical, SimWindow};
use crate::{
    dispatcher::Dispatcher,
    emit::Emitter,
    key::{Edge, Key},
    registry::KeyRegistry,
};

/// Emitter that records every edge with the (tokio) time it was posted.
#[derive(Default)]
pub struct RecordingEmitter {
    /// Recorded edges in posting order.
    log: Mutex<Vec<(Instant, Key, Edge)>>,
}

impl RecordingEmitter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded edges without timestamps.
    pub fn edges(&self) -> Vec<(Key, Edge)> {
        self.log
            .lock()
            .iter()
            .map(|(_, k, e)| (k.clone(), *e))
            .collect()
    }

    /// Recorded edges with timestamps.
    pub fn timed_edges(&self) -> Vec<(Instant, Key, Edge)> {
        self.log.lock().clone()
    }

    /// Count edges of a given kind for `key`.
    pub fn count(&self, key: &str, edge: Edge) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|(_, k, e)| k.name() == key && *e == edge)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Emitter for RecordingEmitter {
    fn emit(&self, key: &Key, edge: Edge) {
        self.log.lock().push((Instant::now(), key.clone(), edge));
    }
}

/// Everything a behavior test needs, wired together.
pub struct Harness {
    /// Shared key registry.
    pub registry: KeyRegistry,
    /// Timer dispatcher.
    pub dispatcher: Dispatcher,
    /// Recorder behind the registry.
    pub emitter: Arc<RecordingEmitter>,
    /// Hardware view behind the registry.
    pub physical: Arc<SimPhysical>,
    /// Foreground window probe.
    pub window: Arc<SimWindow>,
}

/// Build a fresh [`Harness`] with the foreground window set to `"main"`.
pub fn harness() -> Harness {
    let emitter = Arc::new(RecordingEmitter::new());
    let physical = Arc::new(SimPhysical::new());
    Harness {
        registry: KeyRegistry::new(emitter.clone(), physical.clone()),
        dispatcher: Dispatcher::new(),
        emitter,
        physical,
        window: Arc::new(SimWindow::new("main")),
    }
}
