//! Build the behavior graph described by a [`keyfx_config::Config`].
//!
//! Behaviors are built on first reference and memoized by name, so a
//! behavior referenced from several places is one shared instance.

use std::{collections::HashMap, sync::Arc, time::Duration};

use keyfx_config::{ActionSpec, Behavior as Def, Condition, Config};
use tracing::debug;

use crate::{
    Error, Result,
    action::Action,
    behavior::Behavior,
    behaviors::{
        ClickTiming, FixDoubleClick, HoldForContinuousClick, HoldInToggle, HookMode,
        LongShortPress, MultiClick, MultiClickSecondaryAction, OneToMany, Predicate, Record,
        SecondaryMode, ToggleInHold, TriggerAnotherWhen,
    },
    dispatcher::Dispatcher,
    focus::{WindowId, WindowProbe},
    key::Key,
    registry::KeyRegistry,
};

/// Milliseconds from config to a `Duration`.
fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Recursive builder state.
pub(crate) struct Builder<'a> {
    /// Source of definitions.
    config: &'a Config,
    /// Registry handed to key-backed behaviors and actions.
    registry: &'a KeyRegistry,
    /// Timer source for timed behaviors.
    dispatcher: &'a Dispatcher,
    /// Foreground window source for debouncing and window conditions.
    window: &'a Arc<dyn WindowProbe>,
    /// Finished behaviors by name.
    built: HashMap<String, Arc<dyn Behavior>>,
    /// Names currently under construction, outermost first.
    visiting: Vec<String>,
}

impl<'a> Builder<'a> {
    /// Create a builder over `config`.
    pub(crate) fn new(
        config: &'a Config,
        registry: &'a KeyRegistry,
        dispatcher: &'a Dispatcher,
        window: &'a Arc<dyn WindowProbe>,
    ) -> Self {
        Self {
            config,
            registry,
            dispatcher,
            window,
            built: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Build every named behavior, bound or not.
    pub(crate) fn build_all(mut self) -> Result<HashMap<String, Arc<dyn Behavior>>> {
        for name in self.config.behaviors.keys() {
            self.behavior(name)?;
        }
        Ok(self.built)
    }

    /// Build (or fetch) the behavior called `name`.
    fn behavior(&mut self, name: &str) -> Result<Arc<dyn Behavior>> {
        if let Some(b) = self.built.get(name) {
            return Ok(b.clone());
        }
        if let Some(pos) = self.visiting.iter().position(|n| n == name) {
            let mut chain = self.visiting[pos..].to_vec();
            chain.push(name.to_string());
            return Err(Error::BehaviorCycle(chain.join(" -> ")));
        }
        let def = self
            .config
            .behavior(name)
            .ok_or_else(|| Error::UnknownBehavior(name.to_string()))?;

        self.visiting.push(name.to_string());
        let made = self.make(def);
        self.visiting.pop();
        let made = made?;

        debug!(name, kind = made.name(), "behavior_built");
        self.built.insert(name.to_string(), made.clone());
        Ok(made)
    }

    /// Resolve an action spec.
    fn action(&mut self, spec: &ActionSpec) -> Result<Action> {
        Ok(match spec {
            ActionSpec::Key(key) => Action::key(self.registry, key.as_str()),
            ActionSpec::Click { key, hold_ms } => {
                Action::click(self.registry, key.as_str(), ms(*hold_ms))
            }
            ActionSpec::Behavior(name) => Action::behavior(self.behavior(name)?),
        })
    }

    /// Resolve an optional action spec.
    fn maybe_action(&mut self, spec: Option<&ActionSpec>) -> Result<Option<Action>> {
        spec.map(|s| self.action(s)).transpose()
    }

    /// Resolve a list of action specs.
    fn actions(&mut self, specs: &[ActionSpec]) -> Result<Vec<Action>> {
        specs.iter().map(|s| self.action(s)).collect()
    }

    /// Compile a condition into a predicate evaluated at down time.
    fn condition(&self, cond: &Condition) -> Predicate {
        match cond {
            Condition::Pressed(key) => {
                let registry = self.registry.clone();
                let key = Key::new(key);
                Arc::new(move || registry.is_pressed(&key))
            }
            Condition::PhysicallyDown(key) => {
                let registry = self.registry.clone();
                let key = Key::new(key);
                Arc::new(move || registry.is_physically_down(&key))
            }
            Condition::Window(id) => {
                let probe = self.window.clone();
                let want = WindowId(id.clone());
                Arc::new(move || match probe.foreground() {
                    Ok(w) => w == want,
                    Err(e) => {
                        debug!(error = %e, "condition_window_unknown");
                        false
                    }
                })
            }
            Condition::Not(inner) => {
                let p = self.condition(inner);
                Arc::new(move || !p())
            }
            Condition::All(items) => {
                let ps: Vec<Predicate> = items.iter().map(|c| self.condition(c)).collect();
                Arc::new(move || ps.iter().all(|p| p()))
            }
            Condition::Any(items) => {
                let ps: Vec<Predicate> = items.iter().map(|c| self.condition(c)).collect();
                Arc::new(move || ps.iter().any(|p| p()))
            }
        }
    }

    /// Construct one behavior from its definition.
    fn make(&mut self, def: &Def) -> Result<Arc<dyn Behavior>> {
        let registry = self.registry;
        let dispatcher = self.dispatcher;
        let made: Arc<dyn Behavior> = match def {
            Def::Record { key, allow_repeat } => {
                let r = Record::new(registry, key.as_str());
                Arc::new(if *allow_repeat { r.allow_repeat() } else { r })
            }
            Def::ToggleInHold { key, threshold_ms } => {
                Arc::new(ToggleInHold::new(registry, key.as_str()).threshold(ms(*threshold_ms)))
            }
            Def::HoldInToggle {
                key,
                threshold_ms,
                press_time_ms,
            } => Arc::new(HoldInToggle::with_timing(
                registry,
                dispatcher,
                key.as_str(),
                ms(*threshold_ms),
                ms(*press_time_ms),
            )),
            Def::ContinuousClick {
                key,
                interval_ms,
                press_time_ms,
                max_click,
                oscillation,
                trigger,
            } => {
                let timing = ClickTiming {
                    interval: ms(*interval_ms),
                    press_time: ms(*press_time_ms),
                    max_click: *max_click,
                    oscillation: *oscillation,
                };
                Arc::new(match trigger {
                    Some(t) => HoldForContinuousClick::with_trigger(
                        registry,
                        dispatcher,
                        key.as_str(),
                        timing,
                        t.as_str(),
                    )?,
                    None => HoldForContinuousClick::new(registry, dispatcher, key.as_str(), timing)?,
                })
            }
            Def::MultiClick {
                actions,
                threshold_ms,
            } => {
                let actions = self.actions(actions)?;
                Arc::new(MultiClick::with_threshold(
                    dispatcher,
                    actions,
                    ms(*threshold_ms),
                )?)
            }
            Def::SecondaryAction {
                key,
                secondary,
                nth_click,
                threshold_ms,
                mode,
            } => {
                let mode: SecondaryMode = mode.parse()?;
                let secondary = self.action(secondary)?;
                Arc::new(
                    MultiClickSecondaryAction::new(registry, key.as_str(), secondary)
                        .nth_click(*nth_click)?
                        .threshold(ms(*threshold_ms))
                        .mode(mode),
                )
            }
            Def::OneToMany { actions } => Arc::new(OneToMany::new(self.actions(actions)?)?),
            Def::TriggerWhen { branches, default } => {
                let mut built = Vec::with_capacity(branches.len());
                for (cond, spec) in branches {
                    built.push((self.condition(cond), self.action(spec)?));
                }
                let default = self.action(default)?;
                Arc::new(TriggerAnotherWhen::new(built, default))
            }
            Def::FixDoubleClick {
                key,
                threshold_ms,
                log_stats,
            } => Arc::new(
                FixDoubleClick::new(registry, key.as_str(), self.window.clone())
                    .threshold(ms(*threshold_ms))
                    .log_stats(*log_stats),
            ),
            Def::LongShortPress {
                threshold_ms,
                hold_key,
                mode,
                on_press,
                on_long,
                on_short,
            } => self.long_short(
                ms(*threshold_ms),
                hold_key.as_deref(),
                mode,
                on_press.as_ref(),
                on_long.as_ref(),
                on_short.as_ref(),
            )?,
        };
        Ok(made)
    }

    /// Pick the `LongShortPress` constructor matching the definition.
    fn long_short(
        &mut self,
        threshold: Duration,
        hold_key: Option<&str>,
        mode: &str,
        on_press: Option<&ActionSpec>,
        on_long: Option<&ActionSpec>,
        on_short: Option<&ActionSpec>,
    ) -> Result<Arc<dyn Behavior>> {
        let mode: HookMode = mode.parse()?;
        let on_long = self.maybe_action(on_long)?;
        let on_short = self.maybe_action(on_short)?;
        let Some(key) = hold_key else {
            let on_press = self.maybe_action(on_press)?;
            return Ok(Arc::new(LongShortPress::new(
                threshold, on_press, on_long, on_short,
            )));
        };
        let on_long = on_long.ok_or(Error::NoActions("long_short_press with hold_key"))?;
        Ok(Arc::new(match on_short {
            Some(short) => {
                LongShortPress::hold_key(self.registry, key, threshold, on_long, short, mode)
            }
            None => LongShortPress::hold_key_long_only(self.registry, key, threshold, on_long, mode),
        }))
    }
}
