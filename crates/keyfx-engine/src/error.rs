use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the keyfx engine.
///
/// Everything except [`Error::WindowProbe`] is a configuration error raised
/// while constructing a behavior; nothing here is produced at dispatch time.
#[derive(Debug, Error)]
pub enum Error {
    /// A mode string did not name a known mode.
    #[error("Invalid mode '{value}' (expected one of: {expected})")]
    InvalidMode {
        /// The rejected string.
        value: String,
        /// Accepted values, for the message.
        expected: &'static str,
    },

    /// The secondary-action click ordinal must be 2 or more.
    #[error("nth click must be at least 2, got {0}")]
    NthClickTooSmall(usize),

    /// An action was built with neither a press nor a release effect.
    #[error("Action has neither a press nor a release effect")]
    EmptyAction,

    /// A behavior that needs at least one action got none.
    #[error("{0} requires at least one action")]
    NoActions(&'static str),

    /// Timing jitter outside `[0, 1)`.
    #[error("Oscillation must be in [0, 1), got {0}")]
    Oscillation(f64),

    /// A repeat interval of zero would spin.
    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),

    /// A configuration reference to a behavior that does not exist.
    #[error("Unknown behavior '{0}'")]
    UnknownBehavior(String),

    /// Behaviors that chain into each other in a loop.
    #[error("Behavior reference cycle: {0}")]
    BehaviorCycle(String),

    /// Foreground window lookup failed.
    #[error("Window probe failed: {0}")]
    WindowProbe(String),

    /// Configuration loading or validation failed.
    #[error("Config error: {0}")]
    Config(#[from] keyfx_config::Error),
}
