use serde::Deserialize;
use serde::Serialize;

/// Action flags as the backend spells them in `Selection` and
/// `ActionRequest` payloads.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Flag {
    Fold,
    Check,
    Call,
    Bet,
    /// Raise-to: the chip amount is the total commitment for the street.
    Raise,
    #[serde(rename = "ALLIN")]
    AllIn,
    /// Forced blind posting.
    Blind,
    /// Dead chip posted by a returning or new player.
    Dead,
    /// Marks which seat holds the small blind this hand.
    #[serde(rename = "SB")]
    SmallBlind,
    #[serde(rename = "SITOUT")]
    SitOut,
    #[serde(rename = "WAITBB")]
    WaitBigBlind,
    #[serde(other)]
    Unknown,
}

impl Flag {
    /// Posting a forced bet that the decision service must be told about.
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::Blind | Self::Dead)
    }
    /// Leaving the hand without folding.
    pub fn is_opt_out(&self) -> bool {
        matches!(self, Self::SitOut | Self::WaitBigBlind)
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fold => write!(f, "FOLD"),
            Self::Check => write!(f, "CHECK"),
            Self::Call => write!(f, "CALL"),
            Self::Bet => write!(f, "BET"),
            Self::Raise => write!(f, "RAISE"),
            Self::AllIn => write!(f, "ALLIN"),
            Self::Blind => write!(f, "BLIND"),
            Self::Dead => write!(f, "DEAD"),
            Self::SmallBlind => write!(f, "SB"),
            Self::SitOut => write!(f, "SITOUT"),
            Self::WaitBigBlind => write!(f, "WAITBB"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
