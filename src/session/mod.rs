//! Per-connection protocol interpreter.
//!
//! A [`TableSession`] consumes the ordered frames of one client connection,
//! keeps the table and hand picture current, drives one
//! [`DecisionClient`](crate::decision::DecisionClient) per hand, and injects
//! the hero's synthesized actions back into the relay.
mod event;
mod hand;
mod pending;
mod player;
mod settings;
mod table;

pub use event::*;
pub use hand::*;
pub use pending::*;
pub use player::*;
pub use settings::*;
pub use table::*;
