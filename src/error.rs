use std::fmt;

use crate::session::MatchPhase;


// Errors of user-initiated session operations. None of them is fatal: the session stays where
// it was and the error is shown to the user.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SessionError {
    // Empty or malformed address or settings.
    InvalidInput(String),
    // Transport could not open the channel. Session goes back to idle.
    ConnectionError(String),
    // Owner-only action attempted by someone else.
    PermissionDenied(String),
    // Start attempted without an active channel.
    NotConnected,
    // The channel is gone and the session with it.
    PeerDisconnected,
    // Action not allowed in the current phase of the match.
    WrongPhase(MatchPhase),
}

impl SessionError {
    pub fn title(&self) -> &'static str {
        match self {
            SessionError::ConnectionError(_) => "Connection Error",
            SessionError::PeerDisconnected => "Peer Disconnected",
            SessionError::InvalidInput(_)
            | SessionError::PermissionDenied(_)
            | SessionError::NotConnected
            | SessionError::WrongPhase(_) => "Error",
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidInput(message) => write!(f, "{message}"),
            SessionError::ConnectionError(reason) => write!(f, "Could not connect to peer. {reason}"),
            SessionError::PermissionDenied(message) => write!(f, "{message}"),
            SessionError::NotConnected => write!(f, "Connection not established."),
            SessionError::PeerDisconnected => write!(f, "The peer disconnected."),
            SessionError::WrongPhase(phase) => write!(f, "Not allowed while {phase}."),
        }
    }
}

impl std::error::Error for SessionError {}
