//! Debounce for a worn switch that chatters.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    behavior::{Behavior, Handled},
    focus::{WindowId, WindowProbe},
    key::Key,
    registry::KeyRegistry,
};

/// Default debounce window.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(10);

/// Edge counters for the ignore-rate log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebounceStats {
    /// Edges passed through.
    pub real: u64,
    /// Edges suppressed.
    pub ignored: u64,
}

impl DebounceStats {
    /// Fraction of edges suppressed so far.
    pub fn ignore_rate(&self) -> f64 {
        let total = self.real + self.ignored;
        if total == 0 {
            0.0
        } else {
            self.ignored as f64 / total as f64
        }
    }
}

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// The last down was swallowed; its up must be swallowed too.
    press_ignored: bool,
    /// The last up was swallowed; its paired down must be swallowed too.
    release_ignored: bool,
    /// Foreground window at the last real edge. `None` if unknown.
    window: Option<WindowId>,
    /// Counters.
    stats: DebounceStats,
}

/// Suppresses a duplicate edge that follows the opposite real edge within
/// `threshold`, unless the foreground window changed in between.
pub struct FixDoubleClick {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Debounced key.
    key: Key,
    /// Debounce window.
    threshold: Duration,
    /// Foreground window source.
    window: Arc<dyn WindowProbe>,
    /// Log every suppressed edge with the running ignore rate.
    log_stats: bool,
    /// Transient state.
    state: Mutex<State>,
}

impl FixDoubleClick {
    /// Debounce `key` with the default threshold.
    pub fn new(registry: &KeyRegistry, key: impl Into<Key>, window: Arc<dyn WindowProbe>) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            registry: registry.clone(),
            key,
            threshold: DEFAULT_THRESHOLD,
            window,
            log_stats: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Override the debounce window.
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Log each suppressed edge with the running ignore rate.
    pub fn log_stats(mut self, on: bool) -> Self {
        self.log_stats = on;
        self
    }

    /// Counters so far.
    pub fn stats(&self) -> DebounceStats {
        self.state.lock().stats
    }

    /// Current foreground window, or `None` when the lookup fails.
    fn current_window(&self) -> Option<WindowId> {
        match self.window.foreground() {
            Ok(w) => Some(w),
            Err(e) => {
                debug!(error = %e, "debounce_window_unknown");
                None
            }
        }
    }

    /// Whether an edge `since` the opposite real edge is chatter.
    ///
    /// An unknown window on either side counts as unchanged, so a failing
    /// probe degrades to time-only suppression.
    fn is_chatter(
        &self,
        since: Option<Duration>,
        last: Option<&WindowId>,
        now: Option<&WindowId>,
    ) -> bool {
        let within = since.is_some_and(|d| d < self.threshold);
        let moved = matches!((last, now), (Some(a), Some(b)) if a != b);
        within && !moved
    }

    /// Count a suppressed edge and log it when enabled.
    fn note_ignored(&self, st: &mut State, edge: &'static str) {
        st.stats.ignored += 1;
        if self.log_stats {
            info!(
                key = %self.key,
                edge,
                ignored = st.stats.ignored,
                rate = st.stats.ignore_rate(),
                "debounce_ignored"
            );
        } else {
            debug!(key = %self.key, edge, "debounce_ignored");
        }
    }
}

#[async_trait]
impl Behavior for FixDoubleClick {
    async fn down(&self) -> Handled {
        let now_window = self.current_window();
        let mut st = self.state.lock();
        if st.release_ignored {
            st.release_ignored = false;
            self.note_ignored(&mut st, "down_paired");
            return Handled::Ignored;
        }
        let since = self.registry.since_released(&self.key);
        if self.is_chatter(since, st.window.as_ref(), now_window.as_ref()) {
            st.press_ignored = true;
            self.note_ignored(&mut st, "down");
            return Handled::Ignored;
        }
        self.registry.press(&self.key, true);
        st.stats.real += 1;
        if now_window.is_some() {
            st.window = now_window;
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let now_window = self.current_window();
        let mut st = self.state.lock();
        if st.press_ignored {
            st.press_ignored = false;
            self.note_ignored(&mut st, "up_paired");
            return Handled::Ignored;
        }
        if !self.registry.state(&self.key).pressed {
            return Handled::Ignored;
        }
        let since = self.registry.since_pressed(&self.key);
        if self.is_chatter(since, st.window.as_ref(), now_window.as_ref()) {
            st.release_ignored = true;
            self.note_ignored(&mut st, "up");
            return Handled::Ignored;
        }
        self.registry.release(&self.key, true);
        st.stats.real += 1;
        if now_window.is_some() {
            st.window = now_window;
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "fix_double_click"
    }
}
