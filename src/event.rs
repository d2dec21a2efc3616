use serde::{Deserialize, Serialize};
use strum::VariantNames;

use crate::board::TurnMove;
use crate::force::Force;


// Sent by the room owner exactly once per game, at game start.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub time_control_seconds: u64,
    // The owner sends the opposite of its own color, so that both sides end up with different ones.
    pub assigned_color_for_recipient: Force,
}

// Everything the two peers say to each other. On the wire: `{"kind": ..., "payload": ...}`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, VariantNames)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PeerMessage {
    Move(TurnMove),
    GameSettings(GameSettings),
}

impl PeerMessage {
    pub fn is_known_kind(kind: &str) -> bool { Self::VARIANTS.contains(&kind) }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DecodedMessage {
    Known(PeerMessage),
    // Sent by a newer version of the protocol. Ignored.
    Unknown { kind: String },
}
