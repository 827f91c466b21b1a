//! Foreground window lookup used to reset debounce state on focus change.

use std::fmt::{self, Display};

use crate::{Error, Result};

/// Identity of the foreground window as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(pub String);

impl Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Source of the current foreground window.
pub trait WindowProbe: Send + Sync {
    /// Look up the foreground window. Failures are transient; callers treat
    /// them as "unknown window".
    fn foreground(&self) -> Result<WindowId>;
}

/// Probe for hosts without window information. Always unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWindow;

impl WindowProbe for NoWindow {
    fn foreground(&self) -> Result<WindowId> {
        Err(Error::WindowProbe("no window probe installed".into()))
    }
}
