//! A long hold becomes an auto-released toggle; a short tap stays a click.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    behavior::{Behavior, Handled},
    dispatcher::Dispatcher,
    key::Key,
    registry::KeyRegistry,
};

/// Default hold boundary.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(200);

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// Set between a performed down and its up.
    triggered: bool,
    /// Bumped on every performed down; timers from older downs no-op.
    epoch: u64,
}

/// Shared between the behavior and its armed timer.
struct Inner {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Target key.
    key: Key,
    /// Hold time after which the key is released automatically.
    threshold: Duration,
    /// Hold time for the re-click after a short tap.
    press_time: Duration,
    /// Transient state.
    state: Mutex<State>,
}

/// Presses the key at once. If still held after the threshold the key is
/// released by a timer; a shorter tap releases and clicks the key again on up.
pub struct HoldInToggle {
    /// Shared state.
    inner: Arc<Inner>,
    /// Timer source.
    dispatcher: Dispatcher,
}

impl HoldInToggle {
    /// Build with the default threshold and an atomic re-click.
    pub fn new(registry: &KeyRegistry, dispatcher: &Dispatcher, key: impl Into<Key>) -> Self {
        Self::with_timing(
            registry,
            dispatcher,
            key,
            DEFAULT_THRESHOLD,
            Duration::ZERO,
        )
    }

    /// Build with explicit threshold and re-click hold time.
    pub fn with_timing(
        registry: &KeyRegistry,
        dispatcher: &Dispatcher,
        key: impl Into<Key>,
        threshold: Duration,
        press_time: Duration,
    ) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            inner: Arc::new(Inner {
                registry: registry.clone(),
                key,
                threshold,
                press_time,
                state: Mutex::new(State::default()),
            }),
            dispatcher: dispatcher.clone(),
        }
    }
}

#[async_trait]
impl Behavior for HoldInToggle {
    async fn down(&self) -> Handled {
        let epoch = {
            let mut st = self.inner.state.lock();
            if st.triggered {
                return Handled::Ignored;
            }
            st.triggered = true;
            st.epoch += 1;
            st.epoch
        };
        self.inner.registry.press(&self.inner.key, true);

        let inner = self.inner.clone();
        self.dispatcher.schedule(self.inner.threshold, move || async move {
            let live = {
                let st = inner.state.lock();
                st.triggered && st.epoch == epoch
            };
            if live && inner.registry.is_pressed(&inner.key) {
                debug!(key = %inner.key, "hold_auto_release");
                inner.registry.release(&inner.key, true);
            }
        });
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        {
            let mut st = self.inner.state.lock();
            if !st.triggered {
                return Handled::Ignored;
            }
            st.triggered = false;
        }
        let inner = &self.inner;
        if inner.registry.is_pressed(&inner.key) {
            inner.registry.release(&inner.key, true);
            inner
                .registry
                .click(&inner.key, inner.press_time, true)
                .await;
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "hold_in_toggle"
    }
}
