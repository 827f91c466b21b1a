//! Composable press/release effects.
//!
//! An [`Action`] is what behaviors fire. It is resolved once at construction
//! into one of three forms and never re-inspected at call time.

use std::{
    fmt::{self, Debug},
    sync::Arc,
    time::Duration,
};

use crate::{
    Error, Result,
    behavior::Behavior,
    key::Key,
    registry::KeyRegistry,
};

/// A bare press- or release-side effect.
pub type Effect = Arc<dyn Fn() + Send + Sync>;

/// How a key-backed action maps press/release onto the key.
#[derive(Debug, Clone, Copy)]
enum KeyMode {
    /// Press the key on press, release it on release.
    Hold,
    /// Click the key on press; release does nothing.
    Click {
        /// Hold time for the click; zero is atomic.
        hold: Duration,
    },
}

/// Resolved form of an action.
#[derive(Clone)]
enum Kind {
    /// Drive a key through the registry.
    Key {
        /// Registry the key lives in.
        registry: KeyRegistry,
        /// Target key.
        key: Key,
        /// Press/release mapping.
        mode: KeyMode,
    },
    /// Chain into another behavior's down/up.
    Behavior(Arc<dyn Behavior>),
    /// Arbitrary effects; at least one is present.
    Callbacks {
        /// Effect run on press.
        press: Option<Effect>,
        /// Effect run on release.
        release: Option<Effect>,
    },
}

/// A unit with press and release effects.
#[derive(Clone)]
pub struct Action {
    /// Resolved form.
    kind: Kind,
}

impl Action {
    /// Press `key` on press and release it on release. Registers the key.
    pub fn key(registry: &KeyRegistry, key: impl Into<Key>) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            kind: Kind::Key {
                registry: registry.clone(),
                key,
                mode: KeyMode::Hold,
            },
        }
    }

    /// Click `key` (holding it for `hold`) on press; release is a no-op.
    /// Registers the key.
    pub fn click(registry: &KeyRegistry, key: impl Into<Key>, hold: Duration) -> Self {
        let key = key.into();
        registry.initialize(&key);
        Self {
            kind: Kind::Key {
                registry: registry.clone(),
                key,
                mode: KeyMode::Click { hold },
            },
        }
    }

    /// Chain into `behavior`: press is its `down`, release is its `up`.
    /// The behavior is shared, not owned.
    pub fn behavior(behavior: Arc<dyn Behavior>) -> Self {
        Self {
            kind: Kind::Behavior(behavior),
        }
    }

    /// Build an action from optional press and release effects. At least one
    /// must be present.
    pub fn callbacks(press: Option<Effect>, release: Option<Effect>) -> Result<Self> {
        if press.is_none() && release.is_none() {
            return Err(Error::EmptyAction);
        }
        Ok(Self {
            kind: Kind::Callbacks { press, release },
        })
    }

    /// Run the press effect. An absent effect is a no-op.
    pub async fn press(&self) {
        match &self.kind {
            Kind::Key {
                registry,
                key,
                mode: KeyMode::Hold,
            } => registry.press(key, true),
            Kind::Key {
                registry,
                key,
                mode: KeyMode::Click { hold },
            } => registry.click(key, *hold, true).await,
            Kind::Behavior(b) => {
                b.down().await;
            }
            Kind::Callbacks { press, .. } => {
                if let Some(f) = press {
                    f();
                }
            }
        }
    }

    /// Run the release effect. An absent effect is a no-op.
    pub async fn release(&self) {
        match &self.kind {
            Kind::Key {
                registry,
                key,
                mode: KeyMode::Hold,
            } => registry.release(key, true),
            Kind::Key {
                mode: KeyMode::Click { .. },
                ..
            } => {}
            Kind::Behavior(b) => {
                b.up().await;
            }
            Kind::Callbacks { release, .. } => {
                if let Some(f) = release {
                    f();
                }
            }
        }
    }

    /// Press, then release.
    pub async fn trigger(&self) {
        self.press().await;
        self.release().await;
    }
}

impl From<Arc<dyn Behavior>> for Action {
    fn from(behavior: Arc<dyn Behavior>) -> Self {
        Self::behavior(behavior)
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Key { key, mode, .. } => write!(f, "Action::Key({key}, {mode:?})"),
            Kind::Behavior(b) => write!(f, "Action::Behavior({})", b.name()),
            Kind::Callbacks { press, release } => write!(
                f,
                "Action::Callbacks(press={}, release={})",
                press.is_some(),
                release.is_some()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{behaviors::Record, key::Edge, test_support::harness};

    #[test]
    fn empty_callbacks_rejected() {
        assert!(matches!(
            Action::callbacks(None, None),
            Err(Error::EmptyAction)
        ));
    }

    #[tokio::test]
    async fn key_action_presses_and_releases() {
        let h = harness();
        let a = Action::key(&h.registry, "x");
        a.press().await;
        assert!(h.registry.is_pressed(&Key::new("x")));
        a.release().await;
        assert_eq!(
            h.emitter.edges(),
            vec![("x".into(), Edge::Press), ("x".into(), Edge::Release)]
        );
    }

    #[tokio::test]
    async fn click_action_ignores_release() {
        let h = harness();
        let a = Action::click(&h.registry, "y", Duration::ZERO);
        a.trigger().await;
        a.release().await;
        assert_eq!(h.emitter.edges(), vec![("y".into(), Edge::Click)]);
    }

    #[tokio::test]
    async fn missing_side_is_a_noop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = hits.clone();
        let a = Action::callbacks(
            None,
            Some(Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
        a.press().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        a.release().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn behavior_action_chains_down_up() {
        let h = harness();
        let rec: Arc<dyn Behavior> = Arc::new(Record::new(&h.registry, "z"));
        let a = Action::from(rec);
        // From is the identity on an existing action.
        let a = Action::from(a);
        a.trigger().await;
        assert_eq!(h.emitter.count("z", Edge::Press), 1);
        assert_eq!(h.emitter.count("z", Edge::Release), 1);
    }
}
