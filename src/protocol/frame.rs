use super::Flag;
use crate::Chips;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Message types the relay decodes and hands to sessions.
/// Every other frame is forwarded untouched and never reaches a session.
pub const ROUTED: &[&str] = &[
    "Enter",
    "TableState",
    "Join",
    "HandStart",
    "HandResult",
    "RoundChange",
    "Selection",
    "HoleCards",
    "SeatInfo",
    "BoardCards",
    "ActionRequest",
    "ShowHand",
];

/// Which way a frame was travelling when the relay saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// backend to client
    Inbound,
    /// client to backend
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Inbound => write!(f, "<-"),
            Self::Outbound => write!(f, "->"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: u32,
}

/// A decoded protocol frame: typed header plus opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub header: Header,
    pub payload: Value,
}

impl Frame {
    pub fn kind(&self) -> &str {
        &self.header.kind
    }
    pub fn is_routed(&self) -> bool {
        ROUTED.contains(&self.kind())
    }
    /// Synthesized hero action. Echoes the timestamp of the request it answers.
    pub fn selection(flag: Flag, chip: Option<Chips>, timestamp: i64) -> Self {
        Self {
            header: Header {
                kind: String::from("Selection"),
                channel: crate::SYNTH_CHANNEL,
            },
            payload: serde_json::to_value(Choice {
                flag,
                chip,
                timestamp,
            })
            .unwrap_or(Value::Null),
        }
    }
}

/// Payload of a synthesized `Selection` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub flag: Flag,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chip: Option<Chips>,
    pub timestamp: i64,
}
