//! Settable stand-ins for the hardware and window boundaries.
//!
//! Used when edges come from somewhere other than a live device, such as a
//! replayed script: the driver sets what the hardware and the foreground
//! window report as it goes.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::{
    Error, Result,
    focus::{WindowId, WindowProbe},
    key::Key,
    physical::PhysicalView,
};

/// Physical view backed by a settable set of held keys.
#[derive(Default)]
pub struct SimPhysical {
    /// Keys currently reported as held.
    down: Mutex<HashSet<Key>>,
}

impl SimPhysical {
    /// Create a view with every key up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported hardware state of `key`.
    pub fn set_down(&self, key: &Key, down: bool) {
        let mut held = self.down.lock();
        if down {
            held.insert(key.clone());
        } else {
            held.remove(key);
        }
    }
}

impl PhysicalView for SimPhysical {
    fn is_down(&self, key: &Key) -> bool {
        self.down.lock().contains(key)
    }
}

/// Window probe with a settable foreground window; `None` makes lookups fail.
#[derive(Default)]
pub struct SimWindow {
    /// Current foreground window.
    current: Mutex<Option<WindowId>>,
}

impl SimWindow {
    /// Create a probe reporting `initial`.
    pub fn new(initial: &str) -> Self {
        Self {
            current: Mutex::new(Some(WindowId::from(initial))),
        }
    }

    /// Switch the foreground window.
    pub fn focus(&self, window: &str) {
        *self.current.lock() = Some(WindowId::from(window));
    }

    /// Make subsequent lookups fail.
    pub fn fail(&self) {
        *self.current.lock() = None;
    }
}

impl WindowProbe for SimWindow {
    fn foreground(&self) -> Result<WindowId> {
        self.current
            .lock()
            .clone()
            .ok_or_else(|| Error::WindowProbe("foreground window unavailable".into()))
    }
}
