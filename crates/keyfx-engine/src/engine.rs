//! Input binding table and the glue that routes edges to behaviors.

use std::{collections::HashMap, sync::Arc, time::Duration};

use keyfx_config::Config;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::{
    Result,
    behavior::{Behavior, Handled},
    construct::Builder,
    dispatcher::Dispatcher,
    emit::Emitter,
    focus::WindowProbe,
    key::{InputEdge, Key},
    physical::PhysicalView,
    registry::{KeyRegistry, StateSource},
};

/// Handlers running longer than this are reported; clicks with a long hold
/// legitimately take a while, so the bar is high.
const DISPATCH_WARN_MS: u64 = 1000;

/// Engine owns the shared registry and dispatcher and routes input edges to
/// the behavior bound to each input key.
///
/// Construct via [`Engine::new`] and [`Engine::bind`], or all at once with
/// [`Engine::from_config`]. Drive it with [`Engine::dispatch`], awaiting each
/// call before delivering the next edge.
pub struct Engine {
    /// Shared key state.
    registry: KeyRegistry,
    /// Timers owned by the behaviors.
    dispatcher: Dispatcher,
    /// Foreground window source.
    window: Arc<dyn WindowProbe>,
    /// Input key to behavior routes.
    bindings: RwLock<HashMap<Key, Arc<dyn Behavior>>>,
    /// Behaviors built from config, by name.
    named: HashMap<String, Arc<dyn Behavior>>,
}

impl Engine {
    /// Create an engine with no bindings.
    pub fn new(
        emitter: Arc<dyn Emitter>,
        physical: Arc<dyn PhysicalView>,
        window: Arc<dyn WindowProbe>,
    ) -> Self {
        Self {
            registry: KeyRegistry::new(emitter, physical),
            dispatcher: Dispatcher::new(),
            window,
            bindings: RwLock::new(HashMap::new()),
            named: HashMap::new(),
        }
    }

    /// Build every behavior in `config` and install its bindings.
    pub fn from_config(
        config: &Config,
        emitter: Arc<dyn Emitter>,
        physical: Arc<dyn PhysicalView>,
        window: Arc<dyn WindowProbe>,
    ) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(emitter, physical, window);
        engine.registry.set_edge_log(config.edge_log);

        engine.named =
            Builder::new(config, &engine.registry, &engine.dispatcher, &engine.window)
                .build_all()?;

        // After construction, since building initializes keys.
        for key in &config.physical_keys {
            engine
                .registry
                .set_source(&Key::new(key), StateSource::Physical);
        }

        for (input, name) in &config.bindings {
            if let Some(b) = engine.named.get(name) {
                engine.bind(input.as_str(), b.clone());
            }
        }
        info!(
            behaviors = engine.named.len(),
            bindings = engine.bindings.read().len(),
            "engine_configured"
        );
        Ok(engine)
    }

    /// The shared key registry.
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// The timer dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// A behavior built from config, by name.
    pub fn behavior(&self, name: &str) -> Option<Arc<dyn Behavior>> {
        self.named.get(name).cloned()
    }

    /// Route `input` to `behavior`, returning the previous binding.
    pub fn bind(
        &self,
        input: impl Into<Key>,
        behavior: Arc<dyn Behavior>,
    ) -> Option<Arc<dyn Behavior>> {
        let input = input.into();
        debug!(%input, behavior = behavior.name(), "bind");
        self.bindings.write().insert(input, behavior)
    }

    /// Remove the route for `input`.
    pub fn unbind(&self, input: &Key) -> Option<Arc<dyn Behavior>> {
        self.bindings.write().remove(input)
    }

    /// Whether `input` has a route.
    pub fn is_bound(&self, input: &Key) -> bool {
        self.bindings.read().contains_key(input)
    }

    /// Deliver one input edge. Unbound inputs are ignored.
    pub async fn dispatch(&self, input: &Key, edge: InputEdge) -> Handled {
        let Some(behavior) = self.bindings.read().get(input).cloned() else {
            trace!(%input, ?edge, "dispatch_unbound");
            return Handled::Ignored;
        };
        let start = Instant::now();
        let handled = match edge {
            InputEdge::Down => behavior.down().await,
            InputEdge::Up => behavior.up().await,
        };
        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(DISPATCH_WARN_MS) {
            warn!(
                %input,
                ?edge,
                behavior = behavior.name(),
                elapsed_ms = elapsed.as_millis(),
                "dispatch_slow"
            );
        }
        trace!(%input, ?edge, behavior = behavior.name(), ?handled, "dispatch");
        handled
    }

    /// Cancel every pending timer and task.
    pub async fn shutdown(&self) {
        let pending = self.dispatcher.pending();
        self.dispatcher.clear().await;
        debug!(pending, "engine_shutdown");
    }
}

#[cfg(test)]
mod tests {
    use tokio::time;

    use super::*;
    use crate::{
        behaviors::{HoldInToggle, Record},
        key::Edge,
        test_support::{RecordingEmitter, SimPhysical, SimWindow},
    };

    fn engine() -> (Engine, Arc<RecordingEmitter>, Arc<SimPhysical>) {
        let emitter = Arc::new(RecordingEmitter::new());
        let physical = Arc::new(SimPhysical::new());
        let e = Engine::new(
            emitter.clone(),
            physical.clone(),
            Arc::new(SimWindow::new("main")),
        );
        (e, emitter, physical)
    }

    #[tokio::test]
    async fn routes_bound_and_ignores_unbound() {
        let (e, rec, _) = engine();
        let r = Arc::new(Record::new(e.registry(), "a"));
        assert!(e.bind("f1", r).is_none());
        assert!(e.is_bound(&Key::new("f1")));

        assert_eq!(e.dispatch(&Key::new("f1"), InputEdge::Down).await, Handled::Performed);
        assert_eq!(e.dispatch(&Key::new("f2"), InputEdge::Down).await, Handled::Ignored);
        assert_eq!(e.dispatch(&Key::new("f1"), InputEdge::Up).await, Handled::Performed);
        assert_eq!(
            rec.edges(),
            vec![("a".into(), Edge::Press), ("a".into(), Edge::Release)]
        );

        assert!(e.unbind(&Key::new("f1")).is_some());
        assert_eq!(e.dispatch(&Key::new("f1"), InputEdge::Down).await, Handled::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn from_config_binds_and_marks_physical_keys() {
        let cfg = keyfx_config::load_from_str(
            r#"(
                physical_keys: ["shift"],
                behaviors: { "r": Record(key: "shift"), "spare": Record(key: "b") },
                bindings: [("f1", "r")],
            )"#,
            None,
        )
        .unwrap();
        let emitter = Arc::new(RecordingEmitter::new());
        let physical = Arc::new(SimPhysical::new());
        let e = Engine::from_config(
            &cfg,
            emitter.clone(),
            physical.clone(),
            Arc::new(SimWindow::new("main")),
        )
        .unwrap();
        assert!(e.behavior("spare").is_some());
        assert!(!e.is_bound(&Key::new("spare")));

        e.dispatch(&Key::new("f1"), InputEdge::Down).await;
        assert_eq!(emitter.count("shift", Edge::Press), 1);
        // Answered by hardware, which still reports it up.
        assert!(!e.registry().is_pressed(&Key::new("shift")));
        physical.set_down(&Key::new("shift"), true);
        assert!(e.registry().is_pressed(&Key::new("shift")));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timers() {
        let (e, rec, _) = engine();
        let b = Arc::new(HoldInToggle::new(e.registry(), e.dispatcher(), "alt"));
        e.bind("f1", b);
        e.dispatch(&Key::new("f1"), InputEdge::Down).await;
        assert_eq!(e.dispatcher().pending(), 1);
        e.shutdown().await;
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rec.count("alt", Edge::Release), 0);
    }
}
