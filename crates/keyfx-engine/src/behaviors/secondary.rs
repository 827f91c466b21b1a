//! Plain key on early clicks, a secondary action on the N-th click.

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

/// Default gap allowed between consecutive clicks.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(200);

/// What the N-th click does with the plain key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecondaryMode {
    /// Only the secondary action runs.
    #[default]
    Replace,
    /// The key is pressed as usual and the secondary action runs too.
    Concur,
}

impl FromStr for SecondaryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replace" => Ok(Self::Replace),
            "concur" => Ok(Self::Concur),
            other => Err(Error::InvalidMode {
                value: other.to_string(),
                expected: "replace, concur",
            }),
        }
    }
}

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// Set between a performed down and its up.
    pressed: bool,
    /// Consecutive clicks so far.
    count: usize,
    /// When the last click went down.
    last_pressed_at: Option<Instant>,
    /// The current press is the N-th click.
    secondary: bool,
}

/// Passes the key through on clicks `1..N`, and triggers a secondary action
/// on the N-th consecutive click (a double-click with the default `N = 2`).
pub struct MultiClickSecondaryAction {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Plain key.
    key: Key,
    /// Action for the N-th click.
    secondary: Action,
    /// Click ordinal that triggers the secondary action.
    nth_click: usize,
    /// Max gap between consecutive clicks.
    threshold: Duration,
    /// Whether the plain key also fires on the N-th click.
    mode: SecondaryMode,
    /// Transient state.
    state: Mutex<State>,
}

impl MultiClickSecondaryAction {
    /// Double-click `key` to run `secondary` instead of the key.
    pub fn new(registry: &KeyRegistry, key: impl Into<Key>, secondary: Action) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            registry: registry.clone(),
            key,
            secondary,
            nth_click: 2,
            threshold: DEFAULT_THRESHOLD,
            mode: SecondaryMode::Replace,
            state: Mutex::new(State::default()),
        }
    }

    /// Trigger on the `n`-th consecutive click instead. `n` must be at least 2.
    pub fn nth_click(mut self, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(Error::NthClickTooSmall(n));
        }
        self.nth_click = n;
        Ok(self)
    }

    /// Override the inter-click threshold.
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Choose whether the plain key also fires on the N-th click.
    pub fn mode(mut self, mode: SecondaryMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl Behavior for MultiClickSecondaryAction {
    async fn down(&self) -> Handled {
        let secondary = {
            let mut st = self.state.lock();
            if st.pressed {
                return Handled::Ignored;
            }
            st.pressed = true;
            let now = Instant::now();
            let chained = st
                .last_pressed_at
                .is_some_and(|at| now.saturating_duration_since(at) <= self.threshold);
            st.count = if chained { st.count + 1 } else { 1 };
            st.last_pressed_at = Some(now);
            st.secondary = st.count >= self.nth_click;
            if st.secondary {
                st.count = 0;
            }
            st.secondary
        };
        if secondary {
            debug!(key = %self.key, n = self.nth_click, mode = ?self.mode, "secondary_click");
            if self.mode == SecondaryMode::Concur {
                self.registry.press(&self.key, true);
            }
            self.secondary.press().await;
        } else {
            self.registry.press(&self.key, true);
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let secondary = {
            let mut st = self.state.lock();
            if !st.pressed {
                return Handled::Ignored;
            }
            st.pressed = false;
            st.secondary
        };
        if secondary {
            self.secondary.release().await;
            if self.mode == SecondaryMode::Concur {
                self.registry.release(&self.key, true);
            }
        } else {
            self.registry.release(&self.key, true);
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "multi_click_secondary_action"
    }
}
