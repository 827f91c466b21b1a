//! Live hardware key state, independent of the logical registry.

use crate::key::Key;

/// Read-only query of the actual hardware state of a key.
///
/// Always answers from the device at call time; nothing is cached.
pub trait PhysicalView: Send + Sync {
    /// Return true if `key` is physically held right now.
    fn is_down(&self, key: &Key) -> bool;
}

/// Physical view for hosts without hardware access: every key reads as up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPhysical;

impl PhysicalView for NoPhysical {
    fn is_down(&self, _key: &Key) -> bool {
        false
    }
}
