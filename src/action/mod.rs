//! Mapping abstract decisions onto the backend's legal-action vocabulary,
//! and the delay policy applied before a synthesized action is emitted.
mod legal;
mod suggestion;
mod timing;

pub use legal::*;
pub use suggestion::*;
pub use timing::*;
