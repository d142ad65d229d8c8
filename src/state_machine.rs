//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` maps the current state and an event to the next state plus
//! a list of effects, and the runtime is the only place that performs I/O.

mod effect;
pub mod event;
pub mod input;
pub mod script;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Keyboard, Reply};
pub use event::Event;
pub use input::{Command, InputClass, TextInput};
pub use state::{ConvContext, ConvState, Quiz, QuizKind, QuizMode, UserId, OPERAND_MAX};
pub use transition::{transition, TransitionError};
