//! Tap to toggle a held key, while a long hold still behaves as a hold.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    behavior::{Behavior, Handled},
    key::Key,
    registry::KeyRegistry,
};

/// Default tap/hold boundary.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(200);

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// Set between a performed down and its up.
    triggered: bool,
    /// This press is the tap that turns a latched key off.
    second_toggle: bool,
}

/// A quick tap latches the key down; the next tap releases it. A press held
/// longer than the threshold releases on up, like a plain hold.
pub struct ToggleInHold {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Target key.
    key: Key,
    /// Tap/hold boundary.
    threshold: Duration,
    /// Transient state.
    state: Mutex<State>,
}

impl ToggleInHold {
    /// Toggle `key` with the default threshold.
    pub fn new(registry: &KeyRegistry, key: impl Into<Key>) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            registry: registry.clone(),
            key,
            threshold: DEFAULT_THRESHOLD,
            state: Mutex::new(State::default()),
        }
    }

    /// Override the tap/hold boundary.
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait]
impl Behavior for ToggleInHold {
    async fn down(&self) -> Handled {
        let mut st = self.state.lock();
        if st.triggered {
            return Handled::Ignored;
        }
        st.triggered = true;
        if self.registry.is_pressed(&self.key) {
            st.second_toggle = true;
            debug!(key = %self.key, "toggle_off_armed");
        } else {
            self.registry.press(&self.key, true);
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let mut st = self.state.lock();
        if !st.triggered {
            return Handled::Ignored;
        }
        st.triggered = false;
        let long_hold = self
            .registry
            .since_pressed(&self.key)
            .is_some_and(|held| held > self.threshold);
        if st.second_toggle || long_hold {
            st.second_toggle = false;
            self.registry.release(&self.key, true);
        } else {
            debug!(key = %self.key, "toggle_latched");
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "toggle_in_hold"
    }
}
