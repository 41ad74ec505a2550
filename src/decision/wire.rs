use super::Outcome;
use crate::Chips;
use crate::Position;
use crate::action::Suggestion;
use crate::cards::Card;
use serde::Deserialize;
use serde::Serialize;

/// Move vocabulary shared by `player_move` and `ai_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// A seat in the `start_game` roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entrant {
    pub pid: Position,
    pub name: String,
    pub stack: Chips,
}

/// Messages we send. One JSON object per write, no delimiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Roster is ordered starting at the small blind.
    StartGame {
        small_blind: Chips,
        big_blind: Chips,
        hero: Position,
        players: Vec<Entrant>,
        posted: Vec<Position>,
    },
    PrivateHand {
        pid: Position,
        cards: Vec<Card>,
    },
    DealCommunityCards {
        cards: Vec<Card>,
    },
    PlayerMove {
        pid: Position,
        bet_type: BetType,
        amount: Chips,
    },
    Showdown {
        results: Vec<Outcome>,
    },
}

impl Outbound {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame { .. } => "start_game",
            Self::PrivateHand { .. } => "private_hand",
            Self::DealCommunityCards { .. } => "deal_community_cards",
            Self::PlayerMove { .. } => "player_move",
            Self::Showdown { .. } => "showdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AiAction {
    pub bet_type: BetType,
    #[serde(default)]
    pub amount: Chips,
}

/// Replies we receive. Each one answers exactly one outbound message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Suggestion { ai_action: AiAction },
    Failure { success: bool, error_msg: String },
    Ack { success: bool },
}

impl From<AiAction> for Suggestion {
    fn from(action: AiAction) -> Self {
        match action.bet_type {
            BetType::Fold => Self::Fold,
            BetType::Check => Self::Check,
            BetType::Call => Self::Call,
            BetType::Bet => Self::Bet(action.amount),
            BetType::Raise => Self::Raise(action.amount),
            BetType::AllIn => Self::AllIn,
        }
    }
}
