//! Key state registry.
//!
//! The single owner of logical key state. Behaviors never flip a key's
//! `pressed` flag directly; they go through [`KeyRegistry::press`],
//! [`KeyRegistry::release`] and [`KeyRegistry::click`], which post the edge
//! and update state and timestamps together.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::time::{self, Instant};
use tracing::{info, trace};

use crate::{
    emit::Emitter,
    key::{Edge, Key},
    physical::PhysicalView,
};

/// Logical state of one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Whether the key is logically held.
    pub pressed: bool,
    /// When the key was last pressed with time recording on. `None` if never.
    pub last_pressed_at: Option<Instant>,
    /// When the key was last released with time recording on. `None` if never.
    pub last_released_at: Option<Instant>,
}

/// Where [`KeyRegistry::is_pressed`] answers from for a given key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StateSource {
    /// The logical flag maintained by press/release.
    #[default]
    Logical,
    /// A live hardware query through the physical view.
    Physical,
}

/// Per-key registry entry.
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    /// Logical state.
    state: KeyState,
    /// Answer source for `is_pressed`.
    source: StateSource,
}

/// Shared registry internals.
struct Inner {
    /// Key table; keys are added on first touch and never removed.
    keys: Mutex<HashMap<Key, Entry>>,
    /// Output boundary.
    emitter: Arc<dyn Emitter>,
    /// Live hardware view.
    physical: Arc<dyn PhysicalView>,
    /// When set, every press/release/click is logged at info.
    edge_log: AtomicBool,
}

/// Authoritative store of logical key state, shared by all behaviors.
#[derive(Clone)]
pub struct KeyRegistry {
    /// Shared state.
    inner: Arc<Inner>,
}

impl KeyRegistry {
    /// Create a registry posting edges to `emitter` and answering physical
    /// queries from `physical`.
    pub fn new(emitter: Arc<dyn Emitter>, physical: Arc<dyn PhysicalView>) -> Self {
        Self {
            inner: Arc::new(Inner {
                keys: Mutex::new(HashMap::new()),
                emitter,
                physical,
                edge_log: AtomicBool::new(false),
            }),
        }
    }

    /// Enable or disable the per-edge diagnostic log record.
    pub fn set_edge_log(&self, on: bool) {
        self.inner.edge_log.store(on, Ordering::Relaxed);
    }

    /// Register `key`, resetting it to released with no timestamps.
    pub fn initialize(&self, key: &Key) {
        let mut keys = self.inner.keys.lock();
        let entry = keys.entry(key.clone()).or_default();
        entry.state = KeyState::default();
        trace!(%key, "key_initialize");
    }

    /// Choose where `is_pressed` answers from for `key`.
    pub fn set_source(&self, key: &Key, source: StateSource) {
        self.inner.keys.lock().entry(key.clone()).or_default().source = source;
    }

    /// Snapshot of the logical state of `key`.
    pub fn state(&self, key: &Key) -> KeyState {
        self.inner
            .keys
            .lock()
            .get(key)
            .map(|e| e.state)
            .unwrap_or_default()
    }

    /// Whether `key` is pressed, from its configured [`StateSource`].
    pub fn is_pressed(&self, key: &Key) -> bool {
        let entry = self.inner.keys.lock().get(key).copied().unwrap_or_default();
        match entry.source {
            StateSource::Logical => entry.state.pressed,
            StateSource::Physical => self.inner.physical.is_down(key),
        }
    }

    /// Live hardware state of `key`, ignoring logical state.
    pub fn is_physically_down(&self, key: &Key) -> bool {
        self.inner.physical.is_down(key)
    }

    /// Time since `key` was last pressed, if it ever was.
    pub fn since_pressed(&self, key: &Key) -> Option<Duration> {
        self.state(key)
            .last_pressed_at
            .map(|at| Instant::now().saturating_duration_since(at))
    }

    /// Time since `key` was last released, if it ever was.
    pub fn since_released(&self, key: &Key) -> Option<Duration> {
        self.state(key)
            .last_released_at
            .map(|at| Instant::now().saturating_duration_since(at))
    }

    /// Post a key-down for `key` and mark it pressed.
    pub fn press(&self, key: &Key, record_time: bool) {
        self.post(key, Edge::Press);
        let mut keys = self.inner.keys.lock();
        let state = &mut keys.entry(key.clone()).or_default().state;
        state.pressed = true;
        if record_time {
            state.last_pressed_at = Some(Instant::now());
        }
    }

    /// Post a key-up for `key` and mark it released.
    pub fn release(&self, key: &Key, record_time: bool) {
        self.post(key, Edge::Release);
        let mut keys = self.inner.keys.lock();
        let state = &mut keys.entry(key.clone()).or_default().state;
        state.pressed = false;
        if record_time {
            state.last_released_at = Some(Instant::now());
        }
    }

    /// Click `key`.
    ///
    /// A zero `hold` posts a single atomic click and leaves `pressed`
    /// untouched. Otherwise this presses, waits `hold`, and releases. The wait
    /// is awaited in the caller, so the calling handler does not return (and
    /// the next input edge is not dispatched) until the click completes.
    pub async fn click(&self, key: &Key, hold: Duration, record_time: bool) {
        if hold.is_zero() {
            self.post(key, Edge::Click);
            if record_time {
                let now = Instant::now();
                let mut keys = self.inner.keys.lock();
                let state = &mut keys.entry(key.clone()).or_default().state;
                state.last_pressed_at = Some(now);
                state.last_released_at = Some(now);
            }
            return;
        }
        self.press(key, record_time);
        time::sleep(hold).await;
        self.release(key, record_time);
    }

    /// Hand the edge to the emitter, logging it when enabled.
    fn post(&self, key: &Key, edge: Edge) {
        if self.inner.edge_log.load(Ordering::Relaxed) {
            info!(%key, %edge, "edge");
        } else {
            trace!(%key, %edge, "edge");
        }
        self.inner.emitter.emit(key, edge);
    }
}
