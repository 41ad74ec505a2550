use crate::HandId;
use crate::action::Suggestion;
use tokio::time::Instant;

/// A suggestion the session has not played yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pending {
    /// Arrived before the hero was asked to act.
    Waiting { hand: HandId, suggestion: Suggestion },
    /// The hero is on the clock; play no earlier than `at`.
    Scheduled {
        hand: HandId,
        suggestion: Suggestion,
        at: Instant,
    },
}

impl Pending {
    pub fn at(&self) -> Option<Instant> {
        match self {
            Self::Waiting { .. } => None,
            Self::Scheduled { at, .. } => Some(*at),
        }
    }
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting { .. })
    }
}
