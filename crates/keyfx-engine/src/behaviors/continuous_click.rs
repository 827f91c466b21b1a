//! Auto-repeat clicks while held.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time;
use tracing::{debug, trace};

use crate::{
    Error, Result,
    behavior::{Behavior, Handled},
    dispatcher::{Dispatcher, TimerHandle},
    key::Key,
    registry::KeyRegistry,
};

/// Default gap between clicks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
/// Default hold time of each click.
pub const DEFAULT_PRESS_TIME: Duration = Duration::from_millis(20);

/// Timing of the repeat loop.
#[derive(Debug, Clone, Copy)]
pub struct ClickTiming {
    /// Wait after each click before the next one.
    pub interval: Duration,
    /// How long each click holds the key down.
    pub press_time: Duration,
    /// Stop after this many clicks; `0` repeats until released.
    pub max_click: u32,
    /// Proportional jitter in `[0, 1)` applied to each press and each wait.
    pub oscillation: f64,
}

impl Default for ClickTiming {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            press_time: DEFAULT_PRESS_TIME,
            max_click: 0,
            oscillation: 0.0,
        }
    }
}

/// Scale `base` by a factor drawn uniformly from `[1 - osc, 1 + osc]`.
fn jitter(base: Duration, osc: f64) -> Duration {
    if osc <= 0.0 {
        return base;
    }
    let factor = rand::thread_rng().gen_range(1.0 - osc..=1.0 + osc);
    base.mul_f64(factor)
}

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// Set between a performed down and its up; outlives a loop that ran out
    /// of clicks so repeated downs stay ignored.
    held: bool,
    /// The loop is running.
    active: bool,
    /// Bumped on every performed down; a loop from an older down stops.
    epoch: u64,
    /// Handle of the running loop task.
    task: Option<TimerHandle>,
}

/// Shared between the behavior and its loop task.
struct Inner {
    /// Registry the key lives in.
    registry: KeyRegistry,
    /// Key that is clicked.
    key: Key,
    /// Loop timing.
    timing: ClickTiming,
    /// When set, the loop also stops once this key is physically up.
    trigger: Option<Key>,
    /// Transient state.
    state: Mutex<State>,
}

impl Inner {
    /// Whether the loop started at `epoch` should keep going.
    fn live(&self, epoch: u64) -> bool {
        let running = {
            let st = self.state.lock();
            st.active && st.epoch == epoch
        };
        running
            && self
                .trigger
                .as_ref()
                .is_none_or(|t| self.registry.is_physically_down(t))
    }

    /// Click until released, superseded, or out of clicks.
    async fn run(self: Arc<Self>, epoch: u64) {
        let t = self.timing;
        let mut clicks = 0u32;
        loop {
            if !self.live(epoch) {
                break;
            }
            self.registry.press(&self.key, true);
            time::sleep(jitter(t.press_time, t.oscillation)).await;
            if !self.live(epoch) {
                // Stopped mid-press. After up() the key is already released;
                // when the trigger went up without one, release it here.
                let current = self.state.lock().epoch == epoch;
                if current && self.registry.state(&self.key).pressed {
                    self.registry.release(&self.key, true);
                }
                break;
            }
            self.registry.release(&self.key, true);
            clicks += 1;
            trace!(key = %self.key, clicks, "continuous_click");
            if t.max_click > 0 && clicks >= t.max_click {
                break;
            }
            time::sleep(jitter(t.interval, t.oscillation)).await;
        }
        let mut st = self.state.lock();
        if st.epoch == epoch {
            st.active = false;
            st.task = None;
        }
        debug!(key = %self.key, clicks, "continuous_click_stop");
    }
}

/// Clicks a key every interval while the bound input is held.
///
/// The loop runs as a dispatcher task, so `down` returns at once and `up`
/// truncates the loop at its next wake-up.
pub struct HoldForContinuousClick {
    /// Shared state.
    inner: Arc<Inner>,
    /// Task source.
    dispatcher: Dispatcher,
}

impl HoldForContinuousClick {
    /// Repeat clicks of `key` with `timing`.
    pub fn new(
        registry: &KeyRegistry,
        dispatcher: &Dispatcher,
        key: impl Into<Key>,
        timing: ClickTiming,
    ) -> Result<Self> {
        Self::build(registry, dispatcher, key.into(), timing, None)
    }

    /// Like [`new`](Self::new), but the loop also stops once `trigger` is
    /// physically released, so a lost up cannot leave it running.
    pub fn with_trigger(
        registry: &KeyRegistry,
        dispatcher: &Dispatcher,
        key: impl Into<Key>,
        timing: ClickTiming,
        trigger: impl Into<Key>,
    ) -> Result<Self> {
        Self::build(registry, dispatcher, key.into(), timing, Some(trigger.into()))
    }

    /// Validate timing and assemble the behavior.
    fn build(
        registry: &KeyRegistry,
        dispatcher: &Dispatcher,
        key: Key,
        timing: ClickTiming,
        trigger: Option<Key>,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&timing.oscillation) {
            return Err(Error::Oscillation(timing.oscillation));
        }
        if timing.interval.is_zero() && timing.press_time.is_zero() {
            return Err(Error::ZeroInterval("continuous click"));
        }
        registry.initialize(&key);
        Ok(Self {
            inner: Arc::new(Inner {
                registry: registry.clone(),
                key,
                timing,
                trigger,
                state: Mutex::new(State::default()),
            }),
            dispatcher: dispatcher.clone(),
        })
    }

    /// Whether the click loop is running.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }
}

#[async_trait]
impl Behavior for HoldForContinuousClick {
    async fn down(&self) -> Handled {
        let epoch = {
            let mut st = self.inner.state.lock();
            if st.held {
                return Handled::Ignored;
            }
            st.held = true;
            st.active = true;
            st.epoch += 1;
            st.epoch
        };
        let handle = self.dispatcher.spawn(self.inner.clone().run(epoch));
        let mut st = self.inner.state.lock();
        if st.epoch == epoch && st.active {
            st.task = Some(handle);
        }
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let task = {
            let mut st = self.inner.state.lock();
            if !st.held {
                return Handled::Ignored;
            }
            st.held = false;
            st.active = false;
            st.task.take()
        };
        if let Some(handle) = task {
            self.dispatcher.cancel(handle);
        }
        if self.inner.registry.is_pressed(&self.inner.key) {
            self.inner.registry.release(&self.inner.key, true);
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "hold_for_continuous_click"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{key::Edge, test_support::harness};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn timing(max_click: u32) -> ClickTiming {
        ClickTiming {
            interval: ms(100),
            press_time: ms(20),
            max_click,
            oscillation: 0.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_clicks() {
        let h = harness();
        let b = HoldForContinuousClick::new(&h.registry, &h.dispatcher, "lb", timing(3)).unwrap();
        b.down().await;
        time::sleep(ms(1000)).await;
        assert!(!b.is_active());
        assert_eq!(b.down().await, Handled::Ignored, "still held");
        assert_eq!(h.emitter.count("lb", Edge::Press), 3);
        assert_eq!(h.emitter.count("lb", Edge::Release), 3);

        let presses: Vec<_> = h
            .emitter
            .timed_edges()
            .into_iter()
            .filter(|(_, _, e)| *e == Edge::Press)
            .map(|(at, _, _)| at)
            .collect();
        for pair in presses.windows(2) {
            assert!(pair[1] - pair[0] >= ms(100));
        }
        assert_eq!(b.up().await, Handled::Performed);
        assert_eq!(h.emitter.count("lb", Edge::Release), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn up_truncates_without_leaving_key_pressed() {
        let h = harness();
        let b = HoldForContinuousClick::new(&h.registry, &h.dispatcher, "lb", timing(3)).unwrap();
        b.down().await;
        // First click at 0..20, second at 120..140; release mid-second-press.
        time::sleep(ms(130)).await;
        assert_eq!(b.up().await, Handled::Performed);
        time::sleep(ms(500)).await;
        assert_eq!(h.emitter.count("lb", Edge::Press), 2);
        assert_eq!(h.emitter.count("lb", Edge::Release), 2);
        assert!(!h.registry.is_pressed(&Key::new("lb")));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_until_up_and_repeat_down_ignored() {
        let h = harness();
        let b = HoldForContinuousClick::new(&h.registry, &h.dispatcher, "lb", timing(0)).unwrap();
        assert_eq!(b.down().await, Handled::Performed);
        assert_eq!(b.down().await, Handled::Ignored);
        time::sleep(ms(590)).await;
        b.up().await;
        time::sleep(ms(500)).await;
        assert_eq!(h.emitter.count("lb", Edge::Press), 5);
        assert_eq!(h.emitter.count("lb", Edge::Release), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn physical_release_stops_loop() {
        let h = harness();
        let trigger = Key::new("f1");
        h.physical.set_down(&trigger, true);
        let b =
            HoldForContinuousClick::with_trigger(&h.registry, &h.dispatcher, "lb", timing(0), "f1")
                .unwrap();
        b.down().await;
        time::sleep(ms(200)).await;
        h.physical.set_down(&trigger, false);
        time::sleep(ms(500)).await;
        assert!(!b.is_active());
        assert_eq!(h.emitter.count("lb", Edge::Press), 2);
        assert!(!h.registry.is_pressed(&Key::new("lb")));
    }

    #[tokio::test(start_paused = true)]
    async fn physical_release_mid_press_releases_key() {
        let h = harness();
        let trigger = Key::new("f1");
        h.physical.set_down(&trigger, true);
        let b =
            HoldForContinuousClick::with_trigger(&h.registry, &h.dispatcher, "lb", timing(0), "f1")
                .unwrap();
        b.down().await;
        // Second click holds 120..140; the trigger goes up inside it and no
        // up() ever arrives.
        time::sleep(ms(130)).await;
        h.physical.set_down(&trigger, false);
        time::sleep(ms(500)).await;
        assert!(!b.is_active());
        assert_eq!(h.emitter.count("lb", Edge::Press), 2);
        assert_eq!(h.emitter.count("lb", Edge::Release), 2);
        assert!(!h.registry.is_pressed(&Key::new("lb")));
    }

    #[tokio::test(start_paused = true)]
    async fn oscillation_keeps_timing_in_bounds() {
        let h = harness();
        let t = ClickTiming {
            oscillation: 0.5,
            ..timing(4)
        };
        let b = HoldForContinuousClick::new(&h.registry, &h.dispatcher, "lb", t).unwrap();
        b.down().await;
        time::sleep(ms(2000)).await;
        let edges = h.emitter.timed_edges();
        assert_eq!(edges.len(), 8);
        for pair in edges.chunks(2) {
            let held = pair[1].0 - pair[0].0;
            assert!(held >= ms(9) && held <= ms(31), "held {held:?}");
        }
    }

    #[test]
    fn rejects_bad_oscillation() {
        let h = harness();
        let t = ClickTiming {
            oscillation: 1.0,
            ..ClickTiming::default()
        };
        assert!(matches!(
            HoldForContinuousClick::new(&h.registry, &h.dispatcher, "lb", t),
            Err(Error::Oscillation(_))
        ));
    }

    #[tokio::test]
    async fn up_without_down_is_noop() {
        let h = harness();
        let b = HoldForContinuousClick::new(
            &h.registry,
            &h.dispatcher,
            "lb",
            ClickTiming::default(),
        )
        .unwrap();
        assert_eq!(b.up().await, Handled::Ignored);
        assert!(h.emitter.edges().is_empty());
    }
}
