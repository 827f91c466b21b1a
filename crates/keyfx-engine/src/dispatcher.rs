//! Timer dispatcher for deferred and periodic behavior effects.
//!
//! Schedules a future after a delay, on every interval tick, or right away as
//! a background task. Every scheduled item gets a [`TimerHandle`] that can be
//! cancelled. Behaviors still stale-check their own generation counter inside
//! the callback; cancellation only saves the wakeup.

use std::{
    collections::HashMap,
    future::Future,
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::trace;

/// Maximum time [`Dispatcher::clear`] waits for cancelled tasks to wind down.
pub const STOP_WAIT_TIMEOUT_MS: u64 = 50;

/// Identity of one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Schedules one-shot, periodic and immediate callbacks on the tokio runtime.
///
/// Must be used from within a tokio runtime. On a current-thread runtime
/// callbacks never run concurrently with an input handler, except across the
/// handler's own await points.
#[derive(Clone)]
pub struct Dispatcher {
    /// Live timers by id.
    entries: Arc<Mutex<HashMap<u64, CancellationToken>>>,
    /// Next timer id.
    next_id: Arc<AtomicU64>,
    /// Tracks spawned tasks so `clear` can wait for them.
    tracker: TaskTracker,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with nothing scheduled.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            tracker: TaskTracker::new(),
        }
    }

    /// Allocate an id and cancellation token, registering both.
    fn arm(&self) -> (TimerHandle, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.entries.lock().insert(id, token.clone());
        (TimerHandle(id), token)
    }

    /// Run `f` once after `delay` unless cancelled first.
    ///
    /// Once the delay has elapsed the callback is detached from its handle and
    /// runs to completion; cancelling at that point returns false.
    pub fn schedule<F, Fut>(&self, delay: Duration, f: F) -> TimerHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (handle, cancel) = self.arm();
        let entries = self.entries.clone();
        self.tracker.spawn(async move {
            trace!(timer = handle.0, delay_ms = delay.as_millis(), "timer_armed");
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    trace!(timer = handle.0, "timer_cancelled");
                    return;
                }
            }
            entries.lock().remove(&handle.0);
            trace!(timer = handle.0, "timer_fired");
            f().await;
        });
        handle
    }

    /// Run `f` every `interval` (first run after one interval) until it
    /// returns [`ControlFlow::Break`] or the handle is cancelled.
    ///
    /// Ticks missed while a callback runs are skipped, not bunched.
    pub fn schedule_repeating<F, Fut>(&self, interval: Duration, mut f: F) -> TimerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let (handle, cancel) = self.arm();
        let entries = self.entries.clone();
        self.tracker.spawn(async move {
            trace!(
                timer = handle.0,
                int_ms = interval.as_millis(),
                "repeating_timer_start"
            );
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        trace!(timer = handle.0, "repeating_timer_cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if f().await.is_break() {
                            trace!(timer = handle.0, "repeating_timer_done");
                            break;
                        }
                    }
                }
            }
            entries.lock().remove(&handle.0);
        });
        handle
    }

    /// Run `fut` as a background task right away.
    ///
    /// Unlike [`schedule`](Self::schedule), cancelling interrupts the task at
    /// its next await point.
    pub fn spawn<Fut>(&self, fut: Fut) -> TimerHandle
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (handle, cancel) = self.arm();
        let entries = self.entries.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = fut => {}
                _ = cancel.cancelled() => {
                    trace!(timer = handle.0, "task_cancelled");
                }
            }
            entries.lock().remove(&handle.0);
        });
        handle
    }

    /// Cancel a pending callback. Returns true if it had not yet fired.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        match self.entries.lock().remove(&handle.0) {
            Some(token) => {
                token.cancel();
                trace!(timer = handle.0, "timer_cancel");
                true
            }
            None => false,
        }
    }

    /// Return true if `handle` is still waiting (or, for tasks, running).
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.lock().contains_key(&handle.0)
    }

    /// Number of pending callbacks.
    pub fn pending(&self) -> usize {
        self.entries.lock().len()
    }

    /// Cancel everything and wait briefly for in-flight tasks to finish.
    pub async fn clear(&self) {
        let tokens: Vec<CancellationToken> = {
            let mut map = self.entries.lock();
            map.drain().map(|(_, t)| t).collect()
        };
        for t in &tokens {
            t.cancel();
        }
        self.tracker.close();
        let _ = time::timeout(
            Duration::from_millis(STOP_WAIT_TIMEOUT_MS),
            self.tracker.wait(),
        )
        .await;
        self.tracker.reopen();
        trace!(cancelled = tokens.len(), "dispatcher_clear");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_after_delay() {
        let d = Dispatcher::new();
        let hits = counter();
        let h = hits.clone();
        let handle = d.schedule(Duration::from_millis(100), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(d.is_pending(handle));
        time::sleep(Duration::from_millis(99)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!d.is_pending(handle));
        assert!(!d.cancel(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_one_shot_never_fires() {
        let d = Dispatcher::new();
        let hits = counter();
        let h = hits.clone();
        let handle = d.schedule(Duration::from_millis(50), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(d.cancel(handle));
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(d.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_stops_on_break() {
        let d = Dispatcher::new();
        let hits = counter();
        let h = hits.clone();
        let handle = d.schedule_repeating(Duration::from_millis(10), move || {
            let h = h.clone();
            async move {
                if h.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(!d.is_pending(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_stops_on_cancel() {
        let d = Dispatcher::new();
        let hits = counter();
        let h = hits.clone();
        let handle = d.schedule_repeating(Duration::from_millis(10), move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });
        time::sleep(Duration::from_millis(35)).await;
        assert!(d.cancel(handle));
        let seen = hits.load(Ordering::SeqCst);
        assert_eq!(seen, 3);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_everything() {
        let d = Dispatcher::new();
        let hits = counter();
        for _ in 0..3 {
            let h = hits.clone();
            d.schedule(Duration::from_millis(20), move || async move {
                h.fetch_add(1, Ordering::SeqCst);
            });
        }
        let h = hits.clone();
        d.spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(d.pending(), 4);
        d.clear().await;
        assert_eq!(d.pending(), 0);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // Usable again after a clear.
        let h = hits.clone();
        d.schedule(Duration::from_millis(5), move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
