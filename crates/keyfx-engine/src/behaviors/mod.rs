//! The behavior state machines.
//!
//! Each behavior is an independent type implementing
//! [`Behavior`](crate::Behavior); they share nothing but the key registry and
//! the dispatcher handed to them at construction.

mod continuous_click;
mod fix_double_click;
mod hold_in_toggle;
mod long_short;
mod multi_click;
mod one_to_many;
mod record;
mod secondary;
mod toggle_in_hold;
mod trigger_when;

pub use continuous_click::{ClickTiming, HoldForContinuousClick};
pub use fix_double_click::{DebounceStats, FixDoubleClick};
pub use hold_in_toggle::HoldInToggle;
pub use long_short::{HookMode, LongShortPress};
pub use multi_click::MultiClick;
pub use one_to_many::OneToMany;
pub use record::Record;
pub use secondary::{MultiClickSecondaryAction, SecondaryMode};
pub use toggle_in_hold::ToggleInHold;
pub use trigger_when::{Predicate, TriggerAnotherWhen};
