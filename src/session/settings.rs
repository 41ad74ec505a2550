use crate::action::Delay;
use crate::decision::Dialer;
use std::sync::Arc;
use std::time::Duration;

/// Runtime knobs every session shares.
#[derive(Clone)]
pub struct Settings {
    /// When false, sessions track state but never talk to the decision
    /// service or synthesize frames.
    pub enabled: bool,
    pub delay: Delay,
    pub dialer: Arc<dyn Dialer>,
    /// Optional bound on one decision round trip. None waits indefinitely.
    pub timeout: Option<Duration>,
}
