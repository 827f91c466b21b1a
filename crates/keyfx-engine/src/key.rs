//! Key identifiers and edge kinds.

use std::{
    fmt::{self, Debug, Display},
    sync::Arc,
};

/// Opaque name of a physical or virtual key/button.
///
/// Cheap to clone; equality and hashing are by name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Arc<str>);

impl Key {
    /// Create a key identifier from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The key's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", &self.0)
    }
}

/// Output edge handed to the [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Key down.
    Press,
    /// Key up.
    Release,
    /// Atomic down+up with no observable hold.
    Click,
}

impl Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Press => "press",
            Self::Release => "release",
            Self::Click => "click",
        })
    }
}

/// Input edge arriving from the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEdge {
    /// The bound input went down.
    Down,
    /// The bound input went up.
    Up,
}
