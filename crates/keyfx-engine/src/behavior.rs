//! The `Down()`/`Up()` contract every behavior implements.

use async_trait::async_trait;

/// Whether a handler acted on the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The edge changed state or produced output.
    Performed,
    /// The edge was a repeat, an unmatched up, or otherwise suppressed.
    Ignored,
}

/// A key behavior: a small state machine driven by input edges.
///
/// The binding layer calls [`down`](Self::down) and [`up`](Self::up) once per
/// physical edge and awaits each call before delivering the next edge.
/// Calling `up` without a preceding `down` must be a no-op.
#[async_trait]
pub trait Behavior: Send + Sync {
    /// Handle the bound input going down.
    async fn down(&self) -> Handled;
    /// Handle the bound input going up.
    async fn up(&self) -> Handled;
    /// Short behavior kind name for logs.
    fn name(&self) -> &'static str;
}
