//! Long vs. short press discrimination.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    Error, Result,
    action::Action,
    behavior::{Behavior, Handled},
    key::Key,
    registry::KeyRegistry,
};

/// When the release-time effect runs relative to releasing the key, for the
/// key-backed constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookMode {
    /// Run the effect while the key is still held, then release it.
    Press,
    /// Release the key first, then run the effect.
    #[default]
    Release,
}

impl FromStr for HookMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "press" => Ok(Self::Press),
            "release" => Ok(Self::Release),
            other => Err(Error::InvalidMode {
                value: other.to_string(),
                expected: "press, release",
            }),
        }
    }
}

/// Key held by the key-backed constructors.
struct HeldKey {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// The key pressed on down.
    key: Key,
    /// Ordering of the effect against the release.
    mode: HookMode,
}

/// Runs one of two effects on up depending on how long the input was held.
pub struct LongShortPress {
    /// Long/short boundary; a hold of exactly `threshold` is long.
    threshold: Duration,
    /// Optional effect run immediately on down.
    on_press: Option<Action>,
    /// Effect for a long press.
    on_long: Option<Action>,
    /// Effect for a short press.
    on_short: Option<Action>,
    /// Key pressed for the duration of the hold, if any.
    held: Option<HeldKey>,
    /// When the outstanding down happened.
    pressed_at: Mutex<Option<Instant>>,
}

impl LongShortPress {
    /// General form: optional immediate effect, then a long or short effect
    /// on up. Each effect is triggered (pressed, then released).
    pub fn new(
        threshold: Duration,
        on_press: Option<Action>,
        on_long: Option<Action>,
        on_short: Option<Action>,
    ) -> Self {
        Self {
            threshold,
            on_press,
            on_long,
            on_short,
            held: None,
            pressed_at: Mutex::new(None),
        }
    }

    /// Hold `key` while the input is held and, on up, run `on_long` or
    /// `on_short` before or after releasing it according to `mode`.
    pub fn hold_key(
        registry: &KeyRegistry,
        key: impl Into<Key>,
        threshold: Duration,
        on_long: Action,
        on_short: Action,
        mode: HookMode,
    ) -> Self {
        Self::keyed(registry, key.into(), threshold, Some(on_long), Some(on_short), mode)
    }

    /// Like [`hold_key`](Self::hold_key) with nothing extra on a short press.
    pub fn hold_key_long_only(
        registry: &KeyRegistry,
        key: impl Into<Key>,
        threshold: Duration,
        on_long: Action,
        mode: HookMode,
    ) -> Self {
        Self::keyed(registry, key.into(), threshold, Some(on_long), None, mode)
    }

    /// Shared body of the key-backed constructors.
    fn keyed(
        registry: &KeyRegistry,
        key: Key,
        threshold: Duration,
        on_long: Option<Action>,
        on_short: Option<Action>,
        mode: HookMode,
    ) -> Self {
        registry.initialize(&key);
        Self {
            held: Some(HeldKey {
                registry: registry.clone(),
                key,
                mode,
            }),
            ..Self::new(threshold, None, on_long, on_short)
        }
    }
}

#[async_trait]
impl Behavior for LongShortPress {
    async fn down(&self) -> Handled {
        {
            let mut at = self.pressed_at.lock();
            if at.is_some() {
                return Handled::Ignored;
            }
            *at = Some(Instant::now());
        }
        if let Some(h) = &self.held {
            h.registry.press(&h.key, true);
        }
        if let Some(a) = &self.on_press {
            a.trigger().await;
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let Some(at) = self.pressed_at.lock().take() else {
            return Handled::Ignored;
        };
        let held_for = Instant::now().saturating_duration_since(at);
        let long = held_for >= self.threshold;
        debug!(held_ms = held_for.as_millis(), long, "long_short_up");
        let effect = if long { &self.on_long } else { &self.on_short };

        let release_first = self
            .held
            .as_ref()
            .is_some_and(|h| h.mode == HookMode::Release);
        if release_first && let Some(h) = &self.held {
            h.registry.release(&h.key, true);
        }
        if let Some(a) = effect {
            a.trigger().await;
        }
        if !release_first && let Some(h) = &self.held {
            h.registry.release(&h.key, true);
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "long_short_press"
    }
}
