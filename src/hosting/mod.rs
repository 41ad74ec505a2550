//! Relay-facing surface: the per-link session registry and the TCP tap
//! the relay streams decoded frames through.
mod registry;
mod tap;

pub use registry::*;
pub use tap::*;
