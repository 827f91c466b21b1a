//! keyfx engine
//!
//! Composable key behaviors that turn raw input edges into synthesized key
//! presses, releases and clicks:
//! - a shared [`KeyRegistry`] holding logical key state and posting edges
//! - a [`Dispatcher`] for cancellable delayed and repeating work
//! - [`Action`]s, the press/release units behaviors fire
//! - ten [`behaviors`] (toggle-in-hold, multi-click, debounce, ...)
//! - an [`Engine`] routing input keys to behaviors, optionally built from a
//!   [`keyfx_config::Config`]
//!
//! The host supplies the three boundaries: an [`Emitter`] that posts edges, a
//! [`PhysicalView`] answering hardware key state, and a [`WindowProbe`] for
//! the foreground window. [`sim`] has settable versions of the last two, and
//! [`test_support`] adds a recording emitter.

mod action;
mod behavior;
pub mod behaviors;
mod construct;
mod dispatcher;
mod emit;
mod engine;
mod error;
mod focus;
mod key;
mod physical;
mod registry;
pub mod sim;
pub mod test_support;

pub use action::{Action, Effect};
pub use behavior::{Behavior, Handled};
pub use dispatcher::{Dispatcher, STOP_WAIT_TIMEOUT_MS, TimerHandle};
pub use emit::{Emitter, TraceEmitter};
pub use engine::Engine;
pub use error::{Error, Result};
pub use focus::{NoWindow, WindowId, WindowProbe};
pub use key::{Edge, InputEdge, Key};
pub use physical::{NoPhysical, PhysicalView};
pub use registry::{KeyRegistry, KeyState, StateSource};
