//! Pass-through of a key with optional repeat suppression.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::{
    behavior::{Behavior, Handled},
    key::Key,
    registry::KeyRegistry,
};

/// Presses the key on down and releases it on up.
///
/// With `no_repeat`, OS auto-repeat downs while held are dropped.
pub struct Record {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Target key.
    key: Key,
    /// Drop repeated downs while held.
    no_repeat: bool,
    /// Stamp press/release times in the registry.
    record_time: bool,
    /// Set between a performed down and its up.
    triggered: Mutex<bool>,
}

impl Record {
    /// Pass `key` through with repeat suppression and time recording on.
    pub fn new(registry: &KeyRegistry, key: impl Into<Key>) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            registry: registry.clone(),
            key,
            no_repeat: true,
            record_time: true,
            triggered: Mutex::new(false),
        }
    }

    /// Forward repeated downs instead of dropping them.
    pub fn allow_repeat(mut self) -> Self {
        self.no_repeat = false;
        self
    }

    /// Enable or disable timestamp recording.
    pub fn record_time(mut self, on: bool) -> Self {
        self.record_time = on;
        self
    }
}

#[async_trait]
impl Behavior for Record {
    async fn down(&self) -> Handled {
        {
            let mut triggered = self.triggered.lock();
            if self.no_repeat && *triggered {
                trace!(key = %self.key, "record_repeat_dropped");
                return Handled::Ignored;
            }
            *triggered = true;
        }
        self.registry.press(&self.key, self.record_time);
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        {
            let mut triggered = self.triggered.lock();
            if !*triggered {
                return Handled::Ignored;
            }
            *triggered = false;
        }
        self.registry.release(&self.key, self.record_time);
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "record"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{key::Edge, test_support::harness};

    #[tokio::test]
    async fn repeats_are_dropped_by_default() {
        let h = harness();
        let b = Record::new(&h.registry, "a");
        assert_eq!(b.down().await, Handled::Performed);
        assert_eq!(b.down().await, Handled::Ignored);
        assert_eq!(b.up().await, Handled::Performed);
        assert_eq!(h.emitter.count("a", Edge::Press), 1);
        assert_eq!(h.emitter.count("a", Edge::Release), 1);
    }

    #[tokio::test]
    async fn repeats_forwarded_when_allowed() {
        let h = harness();
        let b = Record::new(&h.registry, "a").allow_repeat();
        b.down().await;
        b.down().await;
        b.up().await;
        assert_eq!(h.emitter.count("a", Edge::Press), 2);
        assert_eq!(h.emitter.count("a", Edge::Release), 1);
    }

    #[tokio::test]
    async fn up_without_down_is_noop() {
        let h = harness();
        let b = Record::new(&h.registry, "a");
        assert_eq!(b.up().await, Handled::Ignored);
        assert!(h.emitter.edges().is_empty());
    }

    #[tokio::test]
    async fn time_recording_can_be_disabled() {
        let h = harness();
        let b = Record::new(&h.registry, "a").record_time(false);
        b.down().await;
        assert!(h.registry.state(&Key::new("a")).last_pressed_at.is_none());
    }
}
