//! Screen state machine
//!
//! Pure transitions in the Elm Architecture style: a user action or a
//! completion comes in, the next state and a list of effects come out. The
//! runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, FailureKind};
pub use state::{Pending, Screen, Sender, ViewState};
pub use transition::{transition, TransitionError};
