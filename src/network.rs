// Transport-agnostic side of networking: the wire codec and the traits a transport implements.
// Sends are fire-and-forget: there are no acknowledgements or retries.

use std::fmt;

use serde::Deserialize;

use crate::event::{DecodedMessage, PeerMessage};


#[derive(Debug)]
pub enum ProtocolError {
    Serde(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Serde(err) => write!(f, "malformed message: {err}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self { ProtocolError::Serde(err) }
}

#[derive(Debug)]
pub enum TransportError {
    ChannelClosed,
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ChannelClosed => write!(f, "channel closed"),
            TransportError::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for TransportError {}


// Assigned by the transport. Every channel event carries it, so that events from a channel we
// have rejected or dropped can be told apart from events on the active one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ChannelId(pub u64);

pub trait PeerChannel: fmt::Debug + Send {
    fn id(&self) -> ChannelId;
    fn send(&mut self, data: String) -> Result<(), TransportError>;
    // Must be idempotent. The transport reports `Disconnected` for the channel afterwards.
    fn close(&mut self);
}

// Outbound connections. The result arrives later as `ConnectionOpened` or `ConnectionFailed`.
pub trait Connector {
    fn connect(&mut self, remote_address: &str);
}


pub fn encode(message: &PeerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

#[derive(Deserialize)]
struct Envelope {
    kind: String,
}

pub fn decode(data: &str) -> Result<DecodedMessage, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(data)?;
    if !PeerMessage::is_known_kind(&envelope.kind) {
        return Ok(DecodedMessage::Unknown { kind: envelope.kind });
    }
    Ok(DecodedMessage::Known(serde_json::from_str(data)?))
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::board::TurnMove;
    use crate::coord::Coord;
    use crate::event::GameSettings;
    use crate::force::Force;
    use crate::piece::PieceKind;

    fn sq(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }

    fn round_trip(message: PeerMessage) {
        let encoded = encode(&message).unwrap();
        assert_eq!(decode(&encoded).unwrap(), DecodedMessage::Known(message));
    }

    #[test]
    fn move_round_trip() {
        round_trip(PeerMessage::Move(TurnMove::new(sq("e2"), sq("e4"))));
        round_trip(PeerMessage::Move(
            TurnMove::new(sq("b7"), sq("b8")).with_promotion(PieceKind::Queen),
        ));
    }

    #[test]
    fn game_settings_round_trip() {
        for force in [Force::White, Force::Black] {
            round_trip(PeerMessage::GameSettings(GameSettings {
                time_control_seconds: 300,
                assigned_color_for_recipient: force,
            }));
        }
    }

    #[test]
    fn wire_format() {
        let encoded = encode(&PeerMessage::GameSettings(GameSettings {
            time_control_seconds: 600,
            assigned_color_for_recipient: Force::Black,
        }))
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "gameSettings",
                "payload": { "timeControlSeconds": 600, "assignedColorForRecipient": "Black" },
            })
        );

        let encoded = encode(&PeerMessage::Move(TurnMove::new(sq("g1"), sq("f3")))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "kind": "move", "payload": { "from": "g1", "to": "f3" } })
        );

        let encoded = encode(&PeerMessage::Move(
            TurnMove::new(sq("a7"), sq("a8")).with_promotion(PieceKind::Queen),
        ))
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "move",
                "payload": { "from": "a7", "to": "a8", "promotion": "Queen" },
            })
        );
    }

    #[test]
    fn unknown_kind_ignored() {
        assert_eq!(
            decode(r#"{"kind": "chat", "payload": {"text": "hi"}}"#).unwrap(),
            DecodedMessage::Unknown { kind: "chat".to_owned() }
        );
        assert_eq!(
            decode(r#"{"kind": "resign"}"#).unwrap(),
            DecodedMessage::Unknown { kind: "resign".to_owned() }
        );
    }

    #[test]
    fn malformed() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"payload": {}}"#).is_err());
        assert!(decode(r#"{"kind": "move", "payload": {"from": "e2"}}"#).is_err());
        assert!(decode(r#"{"kind": "move", "payload": {"from": "e2", "to": "e9"}}"#).is_err());
    }
}
