//! Client for the external decision service.
//!
//! ## Core Types
//!
//! - [`DecisionClient`]: one connection per hand, strictly one request in flight
//! - [`Gate`]: the exclusive send lock, released by replies, errors, or close
//! - [`Dialer`]: how a connection is obtained (TCP in production, duplex in tests)
//! - [`Outbound`] / [`Inbound`]: the JSON wire vocabulary
//! - [`Outcome`]: per-seat showdown accounting sent at hand end
mod client;
mod dialer;
mod gate;
mod showdown;
mod wire;

pub use client::*;
pub use dialer::*;
pub use gate::*;
pub use showdown::*;
pub use wire::*;
