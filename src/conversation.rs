//! Conversation state machine for one chat widget
//!
//! Implements the Elm Architecture pattern with pure state transitions; the
//! runtime owns the session and executes the effects.

mod classify;
mod effect;
pub mod event;
mod message;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use message::{ChatMessage, Role};
pub use state::{ConvState, Session};
pub use transition::transition;
