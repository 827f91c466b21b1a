//! Route an input to the first action whose condition holds.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    action::Action,
    behavior::{Behavior, Handled},
};

/// Condition evaluated once per press.
pub type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Which action a press was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selected {
    /// Index into the branch list.
    Branch(usize),
    /// No predicate held.
    Default,
}

/// Evaluates `(predicate, action)` branches in order on down and routes the
/// press, and its matching release, to the first match or to the default.
///
/// Predicates are only consulted on down; a condition changing while the
/// input is held does not reroute the release.
pub struct TriggerAnotherWhen {
    /// Ordered branches.
    branches: Vec<(Predicate, Action)>,
    /// Fallback when no predicate holds.
    default: Action,
    /// Selection made by the outstanding down.
    selected: Mutex<Option<Selected>>,
}

impl TriggerAnotherWhen {
    /// Route between `branches`, falling back to `default`.
    pub fn new(branches: Vec<(Predicate, Action)>, default: Action) -> Self {
        Self {
            branches,
            default,
            selected: Mutex::new(None),
        }
    }

    /// Action for a selection.
    fn action(&self, sel: Selected) -> &Action {
        match sel {
            Selected::Branch(i) => &self.branches[i].1,
            Selected::Default => &self.default,
        }
    }
}

#[async_trait]
impl Behavior for TriggerAnotherWhen {
    async fn down(&self) -> Handled {
        let sel = {
            let mut selected = self.selected.lock();
            if selected.is_some() {
                return Handled::Ignored;
            }
            let sel = self
                .branches
                .iter()
                .position(|(pred, _)| pred())
                .map_or(Selected::Default, Selected::Branch);
            *selected = Some(sel);
            sel
        };
        debug!(selected = ?sel, "trigger_when_select");
        self.action(sel).press().await;
        Handled::Performed
    }

    async fn up(&self) -> Handled {
        let Some(sel) = self.selected.lock().take() else {
            return Handled::Ignored;
        };
        self.action(sel).release().await;
        Handled::Performed
    }

    fn name(&self) -> &'static str {
        "trigger_another_when"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::{key::Edge, test_support::harness};

    fn flag() -> (Arc<AtomicBool>, Predicate) {
        let f = Arc::new(AtomicBool::new(false));
        let g = f.clone();
        (f, Arc::new(move || g.load(Ordering::SeqCst)))
    }

    #[tokio::test]
    async fn default_runs_and_selection_is_sticky() {
        let h = harness();
        let (f1, p1) = flag();
        let (_f2, p2) = flag();
        let b = TriggerAnotherWhen::new(
            vec![
                (p1, Action::key(&h.registry, "a1")),
                (p2, Action::key(&h.registry, "a2")),
            ],
            Action::key(&h.registry, "d"),
        );
        b.down().await;
        f1.store(true, Ordering::SeqCst);
        b.up().await;
        assert_eq!(
            h.emitter.edges(),
            vec![("d".into(), Edge::Press), ("d".into(), Edge::Release)]
        );

        // Next press sees the new condition.
        h.emitter.clear();
        b.down().await;
        b.up().await;
        assert_eq!(
            h.emitter.edges(),
            vec![("a1".into(), Edge::Press), ("a1".into(), Edge::Release)]
        );
    }

    #[tokio::test]
    async fn first_true_branch_wins() {
        let h = harness();
        let (f1, p1) = flag();
        let (f2, p2) = flag();
        f1.store(true, Ordering::SeqCst);
        f2.store(true, Ordering::SeqCst);
        let b = TriggerAnotherWhen::new(
            vec![
                (p1, Action::key(&h.registry, "a1")),
                (p2, Action::key(&h.registry, "a2")),
            ],
            Action::key(&h.registry, "d"),
        );
        b.down().await;
        assert_eq!(b.down().await, Handled::Ignored);
        b.up().await;
        assert_eq!(h.emitter.count("a1", Edge::Press), 1);
        assert_eq!(h.emitter.count("a2", Edge::Press), 0);
    }

    #[tokio::test]
    async fn up_without_down_is_noop() {
        let h = harness();
        let b = TriggerAnotherWhen::new(Vec::new(), Action::key(&h.registry, "d"));
        assert_eq!(b.up().await, Handled::Ignored);
        assert!(h.emitter.edges().is_empty());
    }
}
