use std::fmt;

use crate::board::DrawReason;
use crate::error::SessionError;
use crate::event::PeerMessage;
use crate::force::Force;
use crate::network::{self, ChannelId, PeerChannel};
use crate::role::PeerRole;
use crate::rules::MatchConfig;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    // Terminal. There is no way to resume the session.
    Disconnected,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FinishReason {
    Checkmate { winner: Force },
    Draw(DrawReason),
    Timeout { winner: Force },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchPhase {
    WaitingForPeer,
    WaitingForStart,
    InProgress,
    Finished(FinishReason),
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPhase::WaitingForPeer => write!(f, "waiting for a peer"),
            MatchPhase::WaitingForStart => write!(f, "waiting for the game to start"),
            MatchPhase::InProgress => write!(f, "the game is in progress"),
            MatchPhase::Finished(_) => write!(f, "the game is over"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChannelRejection {
    // Only one channel per session. The newcomer is turned away, the existing one stays.
    AlreadyConnected,
    // The session ended when the previous channel closed.
    SessionEnded,
    // We were not waiting for an outbound connection.
    NotConnecting,
}

impl fmt::Display for ChannelRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRejection::AlreadyConnected => write!(f, "already connected to a peer"),
            ChannelRejection::SessionEnded => write!(f, "the session has ended"),
            ChannelRejection::NotConnecting => write!(f, "no connection attempt in progress"),
        }
    }
}


// Everything one peer knows about its session. Owned by the match controller; the only place
// where connection, role, config and phase live.
#[derive(Debug)]
pub struct Session {
    connection: ConnectionState,
    role: Option<PeerRole>,
    config: MatchConfig,
    phase: MatchPhase,
    local_address: Option<String>,
    channel: Option<Box<dyn PeerChannel>>,
    // Set once the user asks to leave, so the following disconnect is not blamed on the peer.
    left_locally: bool,
}

impl Session {
    pub fn new(config: MatchConfig) -> Self {
        Session {
            connection: ConnectionState::Idle,
            role: None,
            config,
            phase: MatchPhase::WaitingForPeer,
            local_address: None,
            channel: None,
            left_locally: false,
        }
    }

    pub fn connection(&self) -> ConnectionState { self.connection }
    pub fn role(&self) -> Option<PeerRole> { self.role }
    pub fn config(&self) -> MatchConfig { self.config }
    pub fn phase(&self) -> MatchPhase { self.phase }
    pub fn local_address(&self) -> Option<&str> { self.local_address.as_deref() }
    pub fn local_force(&self) -> Force { self.config.local_force }
    pub fn is_connected(&self) -> bool { self.connection == ConnectionState::Connected }
    pub fn left_locally(&self) -> bool { self.left_locally }
    pub fn is_active_channel(&self, id: ChannelId) -> bool {
        self.channel.as_ref().is_some_and(|channel| channel.id() == id)
    }

    pub fn set_config(&mut self, config: MatchConfig) { self.config = config; }
    pub fn set_phase(&mut self, phase: MatchPhase) {
        log::info!("Match phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn host_open(&mut self, local_address: String) {
        log::info!("Listening on {local_address}");
        self.local_address = Some(local_address);
    }

    pub fn accept_incoming(
        &mut self, mut channel: Box<dyn PeerChannel>,
    ) -> Result<(), ChannelRejection> {
        let rejection = match self.connection {
            ConnectionState::Idle | ConnectionState::Connecting => None,
            ConnectionState::Connected => Some(ChannelRejection::AlreadyConnected),
            ConnectionState::Disconnected => Some(ChannelRejection::SessionEnded),
        };
        if let Some(rejection) = rejection {
            log::warn!("Rejecting incoming channel {:?}: {}", channel.id(), rejection);
            channel.close();
            return Err(rejection);
        }
        log::info!("Accepted incoming channel {:?}; we are the room owner", channel.id());
        self.bind(channel, PeerRole::Owner, Force::White);
        Ok(())
    }

    // Validates the address and marks the session as connecting. Returns the address to connect to.
    pub fn begin_connect(&mut self, remote_address: &str) -> Result<String, SessionError> {
        let remote_address = remote_address.trim();
        if remote_address.is_empty() {
            return Err(SessionError::InvalidInput("Please enter a peer address".to_owned()));
        }
        match self.connection {
            ConnectionState::Idle => {}
            ConnectionState::Connecting => {
                return Err(SessionError::InvalidInput("Already connecting".to_owned()));
            }
            ConnectionState::Connected => {
                return Err(SessionError::InvalidInput("Already connected".to_owned()));
            }
            ConnectionState::Disconnected => return Err(SessionError::PeerDisconnected),
        }
        if self.local_address.as_deref() == Some(remote_address) {
            return Err(SessionError::InvalidInput("Cannot connect to yourself".to_owned()));
        }
        log::info!("Connecting to {remote_address}...");
        self.connection = ConnectionState::Connecting;
        Ok(remote_address.to_owned())
    }

    pub fn connection_opened(
        &mut self, mut channel: Box<dyn PeerChannel>,
    ) -> Result<(), ChannelRejection> {
        let rejection = match self.connection {
            ConnectionState::Connecting => None,
            ConnectionState::Idle => Some(ChannelRejection::NotConnecting),
            ConnectionState::Connected => Some(ChannelRejection::AlreadyConnected),
            ConnectionState::Disconnected => Some(ChannelRejection::SessionEnded),
        };
        if let Some(rejection) = rejection {
            log::warn!("Dropping outbound channel {:?}: {}", channel.id(), rejection);
            channel.close();
            return Err(rejection);
        }
        log::info!("Outbound channel {:?} open; we are the joiner", channel.id());
        self.bind(channel, PeerRole::Joiner, Force::Black);
        Ok(())
    }

    // Returns the error to show, if the failure concerns the current attempt.
    pub fn connection_failed(&mut self, reason: String) -> Option<SessionError> {
        if self.connection != ConnectionState::Connecting {
            log::warn!("Ignoring connection failure outside of a connection attempt: {reason}");
            return None;
        }
        log::warn!("Connection failed: {reason}");
        self.connection = ConnectionState::Idle;
        Some(SessionError::ConnectionError(reason))
    }

    // Returns whether the active channel was the one that closed.
    pub fn channel_closed(&mut self, id: ChannelId) -> bool {
        if !self.is_active_channel(id) {
            log::debug!("Ignoring disconnect of inactive channel {id:?}");
            return false;
        }
        log::info!("Channel {id:?} disconnected");
        self.channel = None;
        self.connection = ConnectionState::Disconnected;
        true
    }

    // Fire-and-forget: failures are logged, never retried.
    pub fn send(&mut self, message: &PeerMessage) {
        let Some(channel) = self.channel.as_mut() else {
            log::warn!("Cannot send {message:?}: no active channel");
            return;
        };
        let data = match network::encode(message) {
            Ok(data) => data,
            Err(err) => {
                log::error!("Cannot encode {message:?}: {err}");
                return;
            }
        };
        log::debug!("-> {data}");
        if let Err(err) = channel.send(data) {
            log::warn!("Failed to send {message:?}: {err}");
        }
    }

    pub fn close(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            self.left_locally = true;
            channel.close();
        }
    }

    fn bind(&mut self, channel: Box<dyn PeerChannel>, role: PeerRole, local_force: Force) {
        self.channel = Some(channel);
        self.connection = ConnectionState::Connected;
        self.role = Some(role);
        self.config.local_force = local_force;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DEFAULT_TIME_CONTROL;
    use crate::test_util::LoopbackChannel;

    fn new_session() -> Session { Session::new(MatchConfig::new(DEFAULT_TIME_CONTROL)) }

    #[test]
    fn owner_on_incoming() {
        let mut session = new_session();
        session.host_open("127.0.0.1:4000".to_owned());
        let (channel, _tap) = LoopbackChannel::new(ChannelId(1));
        session.accept_incoming(Box::new(channel)).unwrap();
        assert_eq!(session.connection(), ConnectionState::Connected);
        assert_eq!(session.role(), Some(PeerRole::Owner));
        assert_eq!(session.local_force(), Force::White);
        assert!(session.is_active_channel(ChannelId(1)));
    }

    #[test]
    fn joiner_on_outbound() {
        let mut session = new_session();
        assert_eq!(session.begin_connect("  10.0.0.2:4000 ").unwrap(), "10.0.0.2:4000");
        assert_eq!(session.connection(), ConnectionState::Connecting);
        let (channel, _tap) = LoopbackChannel::new(ChannelId(7));
        session.connection_opened(Box::new(channel)).unwrap();
        assert_eq!(session.connection(), ConnectionState::Connected);
        assert_eq!(session.role(), Some(PeerRole::Joiner));
        assert_eq!(session.local_force(), Force::Black);
    }

    #[test]
    fn empty_address() {
        let mut session = new_session();
        assert!(matches!(session.begin_connect(""), Err(SessionError::InvalidInput(_))));
        assert!(matches!(session.begin_connect("   "), Err(SessionError::InvalidInput(_))));
        assert_eq!(session.connection(), ConnectionState::Idle);
    }

    #[test]
    fn connect_to_self() {
        let mut session = new_session();
        session.host_open("127.0.0.1:4000".to_owned());
        assert!(matches!(
            session.begin_connect("127.0.0.1:4000"),
            Err(SessionError::InvalidInput(_))
        ));
    }

    #[test]
    fn failed_connect_goes_back_to_idle() {
        let mut session = new_session();
        session.begin_connect("10.0.0.2:4000").unwrap();
        assert_eq!(
            session.connection_failed("refused".to_owned()),
            Some(SessionError::ConnectionError("refused".to_owned()))
        );
        assert_eq!(session.connection(), ConnectionState::Idle);
        assert_eq!(session.role(), None);
        // Stray failure when not connecting.
        assert_eq!(session.connection_failed("late".to_owned()), None);
    }

    #[test]
    fn second_incoming_rejected() {
        let mut session = new_session();
        let (first, first_tap) = LoopbackChannel::new(ChannelId(1));
        let (second, second_tap) = LoopbackChannel::new(ChannelId(2));
        session.accept_incoming(Box::new(first)).unwrap();
        assert_eq!(
            session.accept_incoming(Box::new(second)),
            Err(ChannelRejection::AlreadyConnected)
        );
        assert!(second_tap.is_closed());
        assert!(!first_tap.is_closed());
        assert!(session.is_active_channel(ChannelId(1)));
        assert!(!session.is_active_channel(ChannelId(2)));
    }

    #[test]
    fn incoming_wins_over_pending_outbound() {
        let mut session = new_session();
        session.begin_connect("10.0.0.2:4000").unwrap();
        let (incoming, _incoming_tap) = LoopbackChannel::new(ChannelId(1));
        session.accept_incoming(Box::new(incoming)).unwrap();
        assert_eq!(session.role(), Some(PeerRole::Owner));
        let (outbound, outbound_tap) = LoopbackChannel::new(ChannelId(2));
        assert_eq!(
            session.connection_opened(Box::new(outbound)),
            Err(ChannelRejection::AlreadyConnected)
        );
        assert!(outbound_tap.is_closed());
        assert_eq!(session.role(), Some(PeerRole::Owner));
    }

    #[test]
    fn disconnect_is_terminal() {
        let mut session = new_session();
        let (channel, _tap) = LoopbackChannel::new(ChannelId(1));
        session.accept_incoming(Box::new(channel)).unwrap();
        assert!(!session.channel_closed(ChannelId(5)));
        assert!(session.is_connected());
        assert!(session.channel_closed(ChannelId(1)));
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert_eq!(session.begin_connect("10.0.0.2:4000"), Err(SessionError::PeerDisconnected));
        let (late, late_tap) = LoopbackChannel::new(ChannelId(2));
        assert_eq!(session.accept_incoming(Box::new(late)), Err(ChannelRejection::SessionEnded));
        assert!(late_tap.is_closed());
    }

    #[test]
    fn close_remembers_local_leave() {
        let mut session = new_session();
        session.close();
        assert!(!session.left_locally());
        let (channel, tap) = LoopbackChannel::new(ChannelId(1));
        session.accept_incoming(Box::new(channel)).unwrap();
        assert!(!session.left_locally());
        session.close();
        assert!(tap.is_closed());
        assert!(session.left_locally());
        assert!(session.channel_closed(ChannelId(1)));
        assert_eq!(session.connection(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_goes_to_active_channel() {
        let mut session = new_session();
        let (channel, tap) = LoopbackChannel::new(ChannelId(1));
        session.accept_incoming(Box::new(channel)).unwrap();
        session.send(&PeerMessage::GameSettings(crate::event::GameSettings {
            time_control_seconds: 60,
            assigned_color_for_recipient: Force::Black,
        }));
        assert_eq!(tap.take_sent().len(), 1);
    }
}
