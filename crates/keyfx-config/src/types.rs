//! Serde schema for behaviors, actions and conditions.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// What a behavior fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpec {
    /// Press the key on press, release it on release.
    Key(String),
    /// Click the key on press; release does nothing.
    Click {
        /// Key to click.
        key: String,
        /// Hold time of the click; `0` is an atomic click.
        #[serde(default)]
        hold_ms: u64,
    },
    /// Chain into another named behavior.
    Behavior(String),
}

impl ActionSpec {
    /// Name of the behavior this action chains into, if any.
    pub fn behavior_ref(&self) -> Option<&str> {
        match self {
            Self::Behavior(name) => Some(name),
            Self::Key(_) | Self::Click { .. } => None,
        }
    }
}

/// Predicate selecting a `TriggerWhen` branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// The key is pressed according to the registry.
    Pressed(String),
    /// The key is held on the hardware.
    PhysicallyDown(String),
    /// The foreground window has this identifier.
    Window(String),
    /// Negation.
    Not(Box<Self>),
    /// Every condition holds. Empty is true.
    All(Vec<Self>),
    /// Some condition holds. Empty is false.
    Any(Vec<Self>),
}

/// A behavior definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Behavior {
    /// Mirror the input onto `key`.
    Record {
        /// Target key.
        key: String,
        /// Let repeated downs re-press the key.
        #[serde(default)]
        allow_repeat: bool,
    },
    /// Hold to hold, quick tap to latch.
    ToggleInHold {
        /// Target key.
        key: String,
        /// Holds longer than this release on up.
        #[serde(default = "default_toggle_in_hold_ms")]
        threshold_ms: u64,
    },
    /// Tap to hold for a while, auto-release after the threshold.
    HoldInToggle {
        /// Target key.
        key: String,
        /// Auto-release delay.
        #[serde(default = "default_hold_in_toggle_ms")]
        threshold_ms: u64,
        /// Hold time of the click sent on an early up.
        #[serde(default = "default_hold_in_toggle_press_ms")]
        press_time_ms: u64,
    },
    /// Click `key` repeatedly while held.
    ContinuousClick {
        /// Target key.
        key: String,
        /// Gap between clicks.
        #[serde(default = "default_continuous_interval_ms")]
        interval_ms: u64,
        /// Hold time of each click.
        #[serde(default = "default_continuous_press_ms")]
        press_time_ms: u64,
        /// Stop after this many clicks; `0` is unbounded.
        #[serde(default)]
        max_click: u32,
        /// Proportional timing jitter in `[0, 1)`.
        #[serde(default)]
        oscillation: f64,
        /// Also stop when this key is physically up.
        #[serde(default)]
        trigger: Option<String>,
    },
    /// One action per click depth.
    MultiClick {
        /// `actions[n - 1]` fires for an n-click chord.
        actions: Vec<ActionSpec>,
        /// Max gap between clicks of one chord.
        #[serde(default = "default_multi_click_ms")]
        threshold_ms: u64,
    },
    /// Plain key, with a secondary action on the N-th click.
    SecondaryAction {
        /// Plain key.
        key: String,
        /// Action for the N-th click.
        secondary: ActionSpec,
        /// Click ordinal, at least 2.
        #[serde(default = "default_secondary_nth_click")]
        nth_click: usize,
        /// Max gap between clicks.
        #[serde(default = "default_secondary_ms")]
        threshold_ms: u64,
        /// `"replace"` or `"concur"`.
        #[serde(default = "default_secondary_mode")]
        mode: String,
    },
    /// Fan out to several actions in order.
    OneToMany {
        /// Actions run on every edge.
        actions: Vec<ActionSpec>,
    },
    /// Route to the first branch whose condition holds at down time.
    TriggerWhen {
        /// Ordered `(condition, action)` branches.
        #[serde(default)]
        branches: Vec<(Condition, ActionSpec)>,
        /// Fallback when no branch matches.
        default: ActionSpec,
    },
    /// Drop switch chatter on `key`.
    FixDoubleClick {
        /// Debounced key.
        key: String,
        /// Debounce window.
        #[serde(default = "default_fix_double_click_ms")]
        threshold_ms: u64,
        /// Log every suppressed edge with the running ignore rate.
        #[serde(default)]
        log_stats: bool,
    },
    /// Long vs. short press.
    LongShortPress {
        /// Long/short boundary.
        #[serde(default = "default_long_short_ms")]
        threshold_ms: u64,
        /// Key held for the duration of the press.
        #[serde(default)]
        hold_key: Option<String>,
        /// `"press"` or `"release"`; only meaningful with `hold_key`.
        #[serde(default = "default_hook_mode")]
        mode: String,
        /// Effect run immediately on down. Not allowed with `hold_key`.
        #[serde(default)]
        on_press: Option<ActionSpec>,
        /// Effect for a long press.
        #[serde(default)]
        on_long: Option<ActionSpec>,
        /// Effect for a short press.
        #[serde(default)]
        on_short: Option<ActionSpec>,
    },
}

impl Behavior {
    /// Every action this behavior fires, in declaration order.
    pub fn actions(&self) -> Vec<&ActionSpec> {
        match self {
            Self::Record { .. }
            | Self::ToggleInHold { .. }
            | Self::HoldInToggle { .. }
            | Self::ContinuousClick { .. }
            | Self::FixDoubleClick { .. } => Vec::new(),
            Self::MultiClick { actions, .. } | Self::OneToMany { actions } => {
                actions.iter().collect()
            }
            Self::SecondaryAction { secondary, .. } => vec![secondary],
            Self::TriggerWhen { branches, default } => branches
                .iter()
                .map(|(_, a)| a)
                .chain(iter::once(default))
                .collect(),
            Self::LongShortPress {
                on_press,
                on_long,
                on_short,
                ..
            } => [on_press, on_long, on_short]
                .into_iter()
                .flatten()
                .collect(),
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record { .. } => "record",
            Self::ToggleInHold { .. } => "toggle_in_hold",
            Self::HoldInToggle { .. } => "hold_in_toggle",
            Self::ContinuousClick { .. } => "continuous_click",
            Self::MultiClick { .. } => "multi_click",
            Self::SecondaryAction { .. } => "secondary_action",
            Self::OneToMany { .. } => "one_to_many",
            Self::TriggerWhen { .. } => "trigger_when",
            Self::FixDoubleClick { .. } => "fix_double_click",
            Self::LongShortPress { .. } => "long_short_press",
        }
    }
}
