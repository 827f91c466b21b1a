//! Output boundary: posting key edges to the host.

use tracing::trace;

use crate::key::{Edge, Key};

/// Sink for synthesized key edges.
///
/// Implementations post the edge to the OS (or a test recorder). Posting
/// failures are not observable at this layer.
pub trait Emitter: Send + Sync {
    /// Post one edge for `key`.
    fn emit(&self, key: &Key, edge: Edge);
}

/// Emitter that only traces edges. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceEmitter;

impl Emitter for TraceEmitter {
    fn emit(&self, key: &Key, edge: Edge) {
        trace!(%key, %edge, "emit_dry_run");
    }
}
