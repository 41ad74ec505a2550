/// Betting round of the current hand.
/// `None` until the backend announces the first round; round identifiers
/// the backend sends that we do not recognize land on `Unknown`.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Street {
    #[default]
    None,
    Pref,
    Flop,
    Turn,
    Rive,
    Showdown,
    Unknown,
}

impl Street {
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pref,
            Self::Flop,
            Self::Turn,
            Self::Rive,
            Self::Showdown,
        ]
    }
    pub const fn n_observed(&self) -> Option<usize> {
        match self {
            Self::Pref => Some(0),
            Self::Flop => Some(3),
            Self::Turn => Some(4),
            Self::Rive | Self::Showdown => Some(5),
            Self::None | Self::Unknown => None,
        }
    }
}

/// backend round identifier
impl From<i64> for Street {
    fn from(round: i64) -> Self {
        match round {
            1 => Self::Pref,
            2 => Self::Flop,
            3 => Self::Turn,
            4 => Self::Rive,
            5 => Self::Showdown,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Street {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Pref => write!(f, "preflop"),
            Self::Flop => write!(f, "flop"),
            Self::Turn => write!(f, "turn"),
            Self::Rive => write!(f, "river"),
            Self::Showdown => write!(f, "showdown"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
