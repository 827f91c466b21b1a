//! Single vs. double vs. N-click disambiguation.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    Error, Result,
    action::Action,
    behavior::{Behavior, Handled},
    dispatcher::Dispatcher,
};

/// Default gap allowed between clicks of one chord.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(200);

/// Transient state.
#[derive(Debug, Default)]
struct State {
    /// Set between a performed down and its up.
    pressed: bool,
    /// Clicks counted in the current chord.
    count: usize,
    /// When the last chord click went down.
    last_pressed_at: Option<Instant>,
    /// `count` as captured by the most recent down.
    count_when_pressed: usize,
    /// Bumped on every performed down; pending timers from older downs no-op.
    epoch: u64,
    /// Epoch whose deferred press has already run.
    fired: Option<u64>,
    /// Epoch whose up arrived before its deferred press ran.
    released_early: Option<u64>,
}

/// Shared between the behavior and its timers.
struct Inner {
    /// `actions[n - 1]` runs for an n-click chord.
    actions: Vec<Action>,
    /// Max gap between clicks of one chord.
    threshold: Duration,
    /// Transient state.
    state: Mutex<State>,
}

impl Inner {
    /// Chord depth.
    fn depth(&self) -> usize {
        self.actions.len()
    }
}

/// Maps 1..=N consecutive clicks onto N distinct actions.
///
/// A chord shorter than N resolves once `threshold` passes without another
/// click; the N-th click resolves immediately.
pub struct MultiClick {
    /// Shared state.
    inner: Arc<Inner>,
    /// Timer source.
    dispatcher: Dispatcher,
}

impl MultiClick {
    /// Disambiguate `actions.len()` click depths with the default threshold.
    pub fn new(dispatcher: &Dispatcher, actions: Vec<Action>) -> Result<Self> {
        Self::with_threshold(dispatcher, actions, DEFAULT_THRESHOLD)
    }

    /// Disambiguate with an explicit inter-click threshold.
    pub fn with_threshold(
        dispatcher: &Dispatcher,
        actions: Vec<Action>,
        threshold: Duration,
    ) -> Result<Self> {
        if actions.is_empty() {
            return Err(Error::NoActions("multi click"));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                actions,
                threshold,
                state: Mutex::new(State::default()),
            }),
            dispatcher: dispatcher.clone(),
        })
    }
}

#[async_trait]
impl Behavior for MultiClick {
    async fn down(&self) -> Handled {
        let depth = self.inner.depth();
        let (count, epoch) = {
            let mut st = self.inner.state.lock();
            if st.pressed {
                return Handled::Ignored;
            }
            st.pressed = true;
            let now = Instant::now();
            let chained = st
                .last_pressed_at
                .is_some_and(|at| now.saturating_duration_since(at) <= self.inner.threshold);
            st.count = if chained { st.count + 1 } else { 1 };
            st.last_pressed_at = Some(now);
            st.count_when_pressed = st.count;
            st.epoch += 1;
            if st.count >= depth {
                st.count = 0;
            }
            (st.count_when_pressed, st.epoch)
        };
        debug!(count, depth, "multi_click_down");

        if count >= depth {
            self.inner.actions[depth - 1].press().await;
            return Handled::Performed;
        }

        let inner = self.inner.clone();
        self.dispatcher.schedule(self.inner.threshold, move || async move {
            if inner.state.lock().epoch != epoch {
                return;
            }
            debug!(count, "multi_click_resolved");
            inner.actions[count - 1].press().await;
            let release_now = {
                let mut st = inner.state.lock();
                // A newer down implies this click's up already came.
                let superseded = st.epoch != epoch;
                if !superseded {
                    st.fired = Some(epoch);
                }
                superseded || st.released_early == Some(epoch)
            };
            if release_now {
                inner.actions[count - 1].release().await;
            }
        });
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let depth = self.inner.depth();
        let (count, release_now) = {
            let mut st = self.inner.state.lock();
            if !st.pressed {
                return Handled::Ignored;
            }
            st.pressed = false;
            let count = st.count_when_pressed;
            let release_now = count >= depth || st.fired == Some(st.epoch);
            if !release_now {
                // The resolving timer releases right after its press.
                st.released_early = Some(st.epoch);
            }
            (count, release_now)
        };
        if release_now {
            self.inner.actions[count - 1].release().await;
        }
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "multi_click"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time;

    use super::*;
    use crate::{
        key::{Edge, Key},
        test_support::harness,
    };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Action counting presses and releases into the returned counters.
    fn counting() -> (Action, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let presses = Arc::new(AtomicUsize::new(0));
        let releases = Arc::new(AtomicUsize::new(0));
        let (p, r) = (presses.clone(), releases.clone());
        let action = Action::callbacks(
            Some(Arc::new(move || {
                p.fetch_add(1, Ordering::SeqCst);
            })),
            Some(Arc::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
        (action, presses, releases)
    }

    async fn tap(b: &MultiClick, hold: u64) {
        b.down().await;
        time::sleep(ms(hold)).await;
        b.up().await;
    }

    #[tokio::test(start_paused = true)]
    async fn isolated_click_fires_first_action() {
        let d = Dispatcher::new();
        let (a1, p1, r1) = counting();
        let (a2, p2, r2) = counting();
        let b = MultiClick::new(&d, vec![a1, a2]).unwrap();

        tap(&b, 30).await;
        assert_eq!(p1.load(Ordering::SeqCst), 0, "unresolved yet");
        time::sleep(ms(300)).await;
        assert_eq!(p1.load(Ordering::SeqCst), 1);
        assert_eq!(r1.load(Ordering::SeqCst), 1);
        assert_eq!(p2.load(Ordering::SeqCst), 0);
        assert_eq!(r2.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn double_click_fires_only_second_action() {
        let d = Dispatcher::new();
        let (a1, p1, r1) = counting();
        let (a2, p2, r2) = counting();
        let b = MultiClick::new(&d, vec![a1, a2]).unwrap();

        tap(&b, 30).await;
        time::sleep(ms(50)).await;
        b.down().await;
        assert_eq!(p2.load(Ordering::SeqCst), 1, "deepest click is immediate");
        time::sleep(ms(30)).await;
        b.up().await;
        time::sleep(ms(500)).await;
        assert_eq!(p1.load(Ordering::SeqCst), 0);
        assert_eq!(r1.load(Ordering::SeqCst), 0);
        assert_eq!(r2.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_clicks_start_new_chords() {
        let d = Dispatcher::new();
        let (a1, p1, _) = counting();
        let (a2, p2, _) = counting();
        let b = MultiClick::with_threshold(&d, vec![a1, a2], ms(100)).unwrap();

        tap(&b, 10).await;
        time::sleep(ms(200)).await;
        tap(&b, 10).await;
        time::sleep(ms(200)).await;
        assert_eq!(p1.load(Ordering::SeqCst), 2);
        assert_eq!(p2.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn long_hold_releases_after_resolution() {
        let d = Dispatcher::new();
        let (a1, p1, r1) = counting();
        let (a2, _, _) = counting();
        let b = MultiClick::new(&d, vec![a1, a2]).unwrap();

        b.down().await;
        time::sleep(ms(400)).await;
        assert_eq!(p1.load(Ordering::SeqCst), 1, "resolved while held");
        assert_eq!(r1.load(Ordering::SeqCst), 0);
        b.up().await;
        assert_eq!(r1.load(Ordering::SeqCst), 1, "released immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn triple_chord_middle_depth() {
        let d = Dispatcher::new();
        let (a1, p1, _) = counting();
        let (a2, p2, r2) = counting();
        let (a3, p3, _) = counting();
        let b = MultiClick::new(&d, vec![a1, a2, a3]).unwrap();

        tap(&b, 20).await;
        time::sleep(ms(50)).await;
        tap(&b, 20).await;
        time::sleep(ms(400)).await;
        assert_eq!(p1.load(Ordering::SeqCst), 0);
        assert_eq!(p2.load(Ordering::SeqCst), 1);
        assert_eq!(r2.load(Ordering::SeqCst), 1);
        assert_eq!(p3.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn early_up_then_new_chord_still_releases() {
        let h = harness();
        let b = MultiClick::new(
            &h.dispatcher,
            vec![Action::key(&h.registry, "one"), Action::key(&h.registry, "two")],
        )
        .unwrap();

        // Up at 150 precedes the resolving press at 200; the next click at 300
        // starts a fresh chord.
        tap(&b, 150).await;
        time::sleep(ms(150)).await;
        assert_eq!(h.emitter.count("one", Edge::Press), 1);
        tap(&b, 30).await;
        time::sleep(ms(1000)).await;

        assert_eq!(h.emitter.count("one", Edge::Press), 2);
        assert_eq!(h.emitter.count("one", Edge::Release), 2);
        assert!(!h.registry.is_pressed(&Key::new("one")));
        assert_eq!(h.emitter.count("two", Edge::Press), 0);
    }

    #[tokio::test]
    async fn up_without_down_and_empty_actions() {
        let d = Dispatcher::new();
        assert!(matches!(
            MultiClick::new(&d, Vec::new()),
            Err(Error::NoActions(_))
        ));
        let (a1, p1, r1) = counting();
        let b = MultiClick::new(&d, vec![a1]).unwrap();
        assert_eq!(b.up().await, Handled::Ignored);
        assert_eq!(p1.load(Ordering::SeqCst) + r1.load(Ordering::SeqCst), 0);
    }
}
