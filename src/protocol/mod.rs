//! Backend wire vocabulary: frame envelopes, action flags, and the closed
//! set of message kinds the session state machine interprets.
mod flag;
mod frame;
mod message;

pub use flag::*;
pub use frame::*;
pub use message::*;
