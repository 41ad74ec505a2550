use super::Flag;
use crate::Chips;
use crate::HandId;
use crate::Position;
use serde::Deserialize;
use serde_json::Value;

/// Errors that can occur while decoding a routed payload.
#[derive(Debug)]
pub struct DecodeError {
    pub kind: String,
    pub source: serde_json::Error,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed {} payload: {}", self.kind, self.source)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Closed set of message kinds the session interprets.
#[derive(Debug, Clone)]
pub enum Message {
    Enter(Enter),
    TableState(TableState),
    Join(Join),
    HandStart(HandStart),
    HandResult(HandResult),
    RoundChange(RoundChange),
    Selection(Selection),
    HoleCards(HoleCards),
    SeatInfo(SeatInfo),
    BoardCards(BoardCards),
    ActionRequest(ActionRequest),
    ShowHand(ShowHand),
    Unrecognized(String),
}

impl Message {
    pub fn decode(kind: &str, payload: &Value) -> Result<Self, DecodeError> {
        fn parse<T>(kind: &str, payload: &Value) -> Result<T, DecodeError>
        where
            T: serde::de::DeserializeOwned,
        {
            T::deserialize(payload).map_err(|source| DecodeError {
                kind: kind.to_string(),
                source,
            })
        }
        Ok(match kind {
            "Enter" => Self::Enter(parse(kind, payload)?),
            "TableState" => Self::TableState(parse(kind, payload)?),
            "Join" => Self::Join(parse(kind, payload)?),
            "HandStart" => Self::HandStart(parse(kind, payload)?),
            "HandResult" => Self::HandResult(parse(kind, payload)?),
            "RoundChange" => Self::RoundChange(parse(kind, payload)?),
            "Selection" => Self::Selection(parse(kind, payload)?),
            "HoleCards" => Self::HoleCards(parse(kind, payload)?),
            "SeatInfo" => Self::SeatInfo(parse(kind, payload)?),
            "BoardCards" => Self::BoardCards(parse(kind, payload)?),
            "ActionRequest" => Self::ActionRequest(parse(kind, payload)?),
            "ShowHand" => Self::ShowHand(parse(kind, payload)?),
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

/// Client announces which table and account it is attaching.
#[derive(Debug, Clone, Deserialize)]
pub struct Enter {
    pub table_id: u64,
    pub pid: String,
}

/// One physical seat as reported by a table sync or seat update.
#[derive(Debug, Clone, Deserialize)]
pub struct SeatState {
    pub seat: Position,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub stack: Chips,
}

/// Full table snapshot, sent on attach and after reconnects.
#[derive(Debug, Clone, Deserialize)]
pub struct TableState {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub seat_count: usize,
    #[serde(default)]
    pub seats: Vec<SeatState>,
    #[serde(default)]
    pub hero_seat: Option<Position>,
    #[serde(default)]
    pub hand_id: Option<HandId>,
    #[serde(default)]
    pub hero_in_hand: bool,
}

/// Client asks to sit down, optionally at a specific seat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Join {
    #[serde(default)]
    pub seat: Option<Position>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandStart {
    pub hand_id: HandId,
    pub dealer: Position,
    pub seats: Vec<Position>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackUpdate {
    pub seat: Position,
    pub stack: Chips,
}

/// A seat's share of a pot, won or lost, with optional reveal.
#[derive(Debug, Clone, Deserialize)]
pub struct Share {
    pub seat: Position,
    pub chips: Chips,
    #[serde(default)]
    pub cards: Vec<u8>,
}

/// One pot as settled by the backend. `amount` is gross of rake;
/// each winner's `chips` is its gross share.
#[derive(Debug, Clone, Deserialize)]
pub struct Pot {
    pub amount: Chips,
    #[serde(default)]
    pub rake: Chips,
    #[serde(default)]
    pub winners: Vec<Share>,
    #[serde(default)]
    pub losers: Vec<Share>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandResult {
    #[serde(default)]
    pub stacks: Vec<StackUpdate>,
    #[serde(default)]
    pub pots: Vec<Pot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundChange {
    pub round: i64,
}

/// An action taken by some seat, as echoed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct Selection {
    pub seat: Position,
    pub flag: Flag,
    #[serde(default)]
    pub chip: Option<Chips>,
    /// Seat's stack after the action.
    pub stack: Chips,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dealt {
    pub seat: Position,
    pub cards: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoleCards {
    pub dealer: Position,
    pub hands: Vec<Dealt>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeatInfo {
    pub seat: Position,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub stack: Chips,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardCards {
    pub cards: Vec<u8>,
}

/// One entry of the legal-action set offered to the hero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Offer {
    pub flag: Flag,
    #[serde(default)]
    pub chip: Option<Chips>,
    #[serde(default)]
    pub min: Option<Chips>,
    #[serde(default)]
    pub max: Option<Chips>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub timestamp: i64,
    pub actions: Vec<Offer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowHand {
    pub seat: Position,
    pub cards: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_action_request() {
        let payload = json!({
            "timestamp": 99,
            "actions": [
                { "flag": "FOLD" },
                { "flag": "CALL", "chip": 40 },
                { "flag": "RAISE", "min": 80, "max": 1000 },
            ]
        });
        match Message::decode("ActionRequest", &payload).unwrap() {
            Message::ActionRequest(request) => {
                assert_eq!(request.timestamp, 99);
                assert_eq!(request.actions.len(), 3);
                assert_eq!(request.actions[2].max, Some(1000));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_kinds_are_unrecognized() {
        assert!(matches!(
            Message::decode("Chat", &json!({})).unwrap(),
            Message::Unrecognized(kind) if kind == "Chat"
        ));
    }

    #[test]
    fn malformed_payload_names_kind() {
        let err = Message::decode("HandStart", &json!({ "hand_id": "x" })).unwrap_err();
        assert_eq!(err.kind, "HandStart");
        assert!(err.to_string().starts_with("malformed HandStart payload"));
    }

    #[test]
    fn join_without_seat_is_valid() {
        assert!(matches!(
            Message::decode("Join", &json!({})).unwrap(),
            Message::Join(Join { seat: None })
        ));
    }
}
