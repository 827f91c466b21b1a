//! Configuration schema for keyfx: named behaviors and the input bindings
//! that route to them, written in RON.
//!
//! ```ron
//! (
//!     edge_log: true,
//!     behaviors: {
//!         "caps": ToggleInHold(key: "ctrl"),
//!         "mouse4": MultiClick(actions: [Key("back"), Key("forward")]),
//!     },
//!     bindings: [("capslock", "caps"), ("xbutton1", "mouse4")],
//! )
//! ```
//!
//! Timing fields are integer milliseconds and default to the engine's
//! defaults when omitted. Loading validates that every reference resolves;
//! reference cycles are detected by the engine when it builds the graph.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

mod defaults;
mod error;
mod loader;
mod types;

#[cfg(test)]
mod test_parse;

pub use error::{Error, excerpt_at};
pub use loader::{load_from_path, load_from_str};
pub use types::{ActionSpec, Behavior, Condition};

/// A complete keyfx configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log every posted edge at `info` instead of `trace`.
    #[serde(default)]
    pub edge_log: bool,
    /// Keys whose pressed state is answered by the hardware.
    #[serde(default)]
    pub physical_keys: Vec<String>,
    /// Named behavior definitions.
    #[serde(default)]
    pub behaviors: BTreeMap<String, Behavior>,
    /// `(input key, behavior name)` routes.
    #[serde(default)]
    pub bindings: Vec<(String, String)>,
}

impl Config {
    /// Look up a named behavior.
    pub fn behavior(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.get(name)
    }

    /// Check references and per-behavior constraints.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for (input, target) in &self.bindings {
            if input.is_empty() {
                return invalid(format!("binding to '{target}' has an empty input key"));
            }
            if !seen.insert(input.as_str()) {
                return invalid(format!("input '{input}' is bound more than once"));
            }
            if !self.behaviors.contains_key(target) {
                return invalid(format!(
                    "binding '{input}' refers to unknown behavior '{target}'"
                ));
            }
        }
        for (name, behavior) in &self.behaviors {
            self.validate_behavior(name, behavior)?;
        }
        Ok(())
    }

    /// Constraints on a single behavior definition.
    fn validate_behavior(&self, name: &str, behavior: &Behavior) -> Result<(), Error> {
        for action in behavior.actions() {
            let missing = action
                .behavior_ref()
                .filter(|target| !self.behaviors.contains_key(*target));
            if let Some(target) = missing {
                return invalid(format!(
                    "behavior '{name}' refers to unknown behavior '{target}'"
                ));
            }
            let empty_key = match action {
                ActionSpec::Key(key) | ActionSpec::Click { key, .. } => key.is_empty(),
                ActionSpec::Behavior(_) => false,
            };
            if empty_key {
                return invalid(format!("behavior '{name}' has an action with an empty key"));
            }
        }
        match behavior {
            Behavior::MultiClick { actions, .. } | Behavior::OneToMany { actions }
                if actions.is_empty() =>
            {
                invalid(format!(
                    "{} '{name}' needs at least one action",
                    behavior.kind()
                ))
            }
            Behavior::LongShortPress {
                hold_key: Some(_),
                on_press: Some(_),
                ..
            } => invalid(format!(
                "long_short_press '{name}' cannot combine hold_key with on_press"
            )),
            Behavior::LongShortPress {
                hold_key: Some(_),
                on_long: None,
                ..
            } => invalid(format!(
                "long_short_press '{name}' with hold_key needs on_long"
            )),
            _ => Ok(()),
        }
    }
}

/// Shorthand for a validation failure without a path.
fn invalid(message: String) -> Result<(), Error> {
    Err(Error::Validation {
        path: None,
        message,
    })
}
