//! Diary form state machine
//!
//! Pure transitions over a session record: validate the incoming answer
//! against the current step, store it, and say what to show next.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{MessageHandle, SessionId, SessionRecord, Step};
pub use transition::{transition, TransitionError};
