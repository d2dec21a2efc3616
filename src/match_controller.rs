// Improvement potential. Add draw offers and resignation. Currently the only ways for a game to end
//   are the ones the rules engine detects on its own, plus flag fall.

use rand::rngs::StdRng;
use strum::IntoEnumIterator;

use crate::board::{ChessGameStatus, RulesEngine, TurnError, TurnMove, VictoryReason};
use crate::clock::{Clock, TickOutcome, TimeControl};
use crate::coord::Coord;
use crate::error::SessionError;
use crate::event::{DecodedMessage, GameSettings, PeerMessage};
use crate::force::Force;
use crate::frontend::{BoardView, Notifier, Severity};
use crate::network::{self, ChannelId, Connector, PeerChannel};
use crate::piece::PieceKind;
use crate::role::PeerRole;
use crate::rules::{MatchConfig, SettingsInput, parse_time_control_minutes};
use crate::session::{ChannelRejection, FinishReason, MatchPhase, Session};
use crate::ticker::{TickDriver, TickGeneration};


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum UiCommand {
    Connect { remote_address: String },
    StartGame,
    ApplySettings(SettingsInput),
    // A piece dragged from one square and dropped on another.
    DropPiece { from: Coord, to: Coord },
    Leave,
}

// Everything that can happen to a peer. Transport, tick source and user input all funnel into
// one queue which is drained by `MatchController::apply_event`.
#[derive(Debug)]
pub enum IncomingEvent {
    HostOpen { local_address: String },
    IncomingConnection(Box<dyn PeerChannel>),
    ConnectionOpened(Box<dyn PeerChannel>),
    ConnectionFailed { reason: String },
    PeerError { reason: String },
    Data(ChannelId, String),
    Disconnected(ChannelId),
    Tick(TickGeneration),
    Ui(UiCommand),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnCommandError {
    NoGameInProgress,
    // The game was abandoned when the channel closed.
    NotConnected,
    IllegalTurn(TurnError),
}


pub struct MatchController {
    session: Session,
    game: Box<dyn RulesEngine>,
    clock: Clock,
    board: Box<dyn BoardView>,
    notifier: Box<dyn Notifier>,
    ticker: Box<dyn TickDriver>,
    connector: Box<dyn Connector>,
    rng: StdRng,
}

impl MatchController {
    pub fn new(
        config: MatchConfig, game: Box<dyn RulesEngine>, board: Box<dyn BoardView>,
        notifier: Box<dyn Notifier>, ticker: Box<dyn TickDriver>, connector: Box<dyn Connector>,
        rng: StdRng,
    ) -> Self {
        let mut controller = MatchController {
            session: Session::new(config),
            game,
            clock: Clock::new(config.time_control),
            board,
            notifier,
            ticker,
            connector,
            rng,
        };
        controller.board.set_clocks_visible(false);
        controller.show_clocks();
        controller
    }

    pub fn session(&self) -> &Session { &self.session }
    pub fn clock(&self) -> &Clock { &self.clock }
    pub fn game(&self) -> &dyn RulesEngine { self.game.as_ref() }
    pub fn phase(&self) -> MatchPhase { self.session.phase() }

    #[allow(non_snake_case)]
    pub fn TEST_clock_mut(&mut self) -> &mut Clock { &mut self.clock }

    pub fn apply_event(&mut self, event: IncomingEvent) {
        match event {
            IncomingEvent::HostOpen { local_address } => {
                self.board.show_local_address(&local_address);
                self.session.host_open(local_address);
            }
            IncomingEvent::IncomingConnection(channel) => {
                let result = self.session.accept_incoming(channel);
                self.on_channel_result(result);
            }
            IncomingEvent::ConnectionOpened(channel) => {
                let result = self.session.connection_opened(channel);
                self.on_channel_result(result);
            }
            IncomingEvent::ConnectionFailed { reason } => {
                if let Some(err) = self.session.connection_failed(reason) {
                    self.report_error(&err);
                }
            }
            IncomingEvent::PeerError { reason } => {
                log::warn!("Peer error: {reason}");
                self.notifier.notify(
                    "Peer Error",
                    &format!("An error occurred with the peer connection: {reason}"),
                    Severity::Error,
                );
            }
            IncomingEvent::Data(channel_id, data) => {
                if self.session.is_active_channel(channel_id) {
                    self.process_peer_data(&data);
                } else {
                    log::debug!("Dropping data from inactive channel {channel_id:?}");
                }
            }
            IncomingEvent::Disconnected(channel_id) => {
                if self.session.channel_closed(channel_id) {
                    self.stop_clock();
                    if self.session.left_locally() {
                        self.notifier.notify("Disconnected", "You left the game.", Severity::Info);
                    } else {
                        self.report_error(&SessionError::PeerDisconnected);
                    }
                }
            }
            IncomingEvent::Tick(generation) => self.on_tick(generation),
            IncomingEvent::Ui(command) => self.apply_ui_command(command),
        }
    }

    fn apply_ui_command(&mut self, command: UiCommand) {
        let result = match command {
            UiCommand::Connect { remote_address } => self.connect_to(&remote_address),
            UiCommand::StartGame => self.start_game(),
            UiCommand::ApplySettings(input) => self.apply_settings(&input),
            UiCommand::DropPiece { from, to } => {
                if let Err(err) = self.try_local_move(from, to) {
                    log::debug!("Drop {}{} rejected: {err:?}", from, to);
                    // Snap the piece back.
                    self.board.set_position(&self.game.fen());
                }
                Ok(())
            }
            UiCommand::Leave => {
                self.leave();
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report_error(&err);
        }
    }

    pub fn connect_to(&mut self, remote_address: &str) -> Result<(), SessionError> {
        let remote_address = self.session.begin_connect(remote_address)?;
        self.connector.connect(&remote_address);
        Ok(())
    }

    pub fn start_game(&mut self) -> Result<(), SessionError> {
        if self.session.role() == Some(PeerRole::Joiner) {
            return Err(SessionError::PermissionDenied(
                "Only the room owner can start the game".to_owned(),
            ));
        }
        if !self.session.is_connected() {
            return Err(SessionError::NotConnected);
        }
        match self.session.phase() {
            MatchPhase::WaitingForStart | MatchPhase::Finished(_) => {}
            phase @ (MatchPhase::WaitingForPeer | MatchPhase::InProgress) => {
                return Err(SessionError::WrongPhase(phase));
            }
        }
        let config = self.session.config();
        log::info!(
            "Starting game: {} per move, playing {}",
            config.time_control,
            config.local_force
        );
        self.session.set_phase(MatchPhase::InProgress);
        self.init_game();
        self.start_clock();
        self.session.send(&PeerMessage::GameSettings(GameSettings {
            time_control_seconds: config.time_control.as_secs(),
            assigned_color_for_recipient: config.local_force.opponent(),
        }));
        Ok(())
    }

    pub fn apply_settings(&mut self, input: &SettingsInput) -> Result<(), SessionError> {
        if self.session.role() != Some(PeerRole::Owner) {
            return Err(SessionError::PermissionDenied(
                "Only the room owner can change settings".to_owned(),
            ));
        }
        let phase = self.session.phase();
        if phase != MatchPhase::WaitingForStart {
            return Err(SessionError::WrongPhase(phase));
        }
        let time_control = parse_time_control_minutes(&input.time_control_minutes)?;
        let local_force = input.color.resolve(&mut self.rng);
        log::info!("Settings: {time_control} per move, owner plays {local_force}");
        self.session.set_config(MatchConfig { time_control, local_force });
        self.clock.reset(time_control);
        self.board.set_orientation(local_force);
        self.show_clocks();
        self.notifier.notify("Settings Applied", "Game settings have been updated", Severity::Success);
        Ok(())
    }

    // Whether the user may pick up a piece at all. The board view uses this to refuse drags early.
    pub fn can_make_local_turn(&self) -> bool {
        self.session.phase() == MatchPhase::InProgress
            && self.session.is_connected()
            && !self.game.is_game_over()
            && self.game.active_force() == self.session.local_force()
    }

    // Promotion is always to a queen.
    pub fn try_local_move(&mut self, from: Coord, to: Coord) -> Result<TurnMove, TurnCommandError> {
        match self.session.phase() {
            MatchPhase::InProgress => {}
            MatchPhase::Finished(_) => return Err(TurnCommandError::IllegalTurn(TurnError::GameOver)),
            MatchPhase::WaitingForPeer | MatchPhase::WaitingForStart => {
                return Err(TurnCommandError::NoGameInProgress);
            }
        }
        if !self.session.is_connected() {
            return Err(TurnCommandError::NotConnected);
        }
        if self.game.is_game_over() {
            return Err(TurnCommandError::IllegalTurn(TurnError::GameOver));
        }
        let moved = self.game.active_force();
        if moved != self.session.local_force() {
            return Err(TurnCommandError::IllegalTurn(TurnError::WrongTurnOrder));
        }
        let applied = self
            .game
            .try_move(TurnMove::new(from, to).with_promotion(PieceKind::Queen))
            .map_err(TurnCommandError::IllegalTurn)?;
        self.after_move(moved);
        self.session.send(&PeerMessage::Move(applied));
        Ok(applied)
    }

    // Leaves the session: closes the channel and stops the clock. The transport reports the
    // disconnect afterwards.
    pub fn leave(&mut self) {
        self.stop_clock();
        self.session.close();
    }

    fn on_channel_result(&mut self, result: Result<(), ChannelRejection>) {
        match result {
            Ok(()) => {
                self.notifier.notify("Connected", "You are now connected to a peer!", Severity::Success);
                self.session.set_phase(MatchPhase::WaitingForStart);
                self.init_game();
                self.board.set_clocks_visible(false);
            }
            Err(rejection) => {
                self.notifier.notify(
                    "Connection Rejected",
                    &format!("Another peer tried to connect: {rejection}"),
                    Severity::Info,
                );
            }
        }
    }

    fn process_peer_data(&mut self, data: &str) {
        log::debug!("<- {data}");
        match network::decode(data) {
            Ok(DecodedMessage::Known(PeerMessage::Move(mv))) => self.apply_remote_move(mv),
            Ok(DecodedMessage::Known(PeerMessage::GameSettings(settings))) => {
                self.apply_game_settings(settings)
            }
            Ok(DecodedMessage::Unknown { kind }) => {
                log::warn!("Ignoring message of unknown kind '{kind}'");
            }
            Err(err) => {
                log::error!("Cannot decode peer message {data:?}: {err}");
                self.notifier.notify(
                    "Protocol Error",
                    &format!("Received a {err} from the peer"),
                    Severity::Error,
                );
            }
        }
    }

    fn apply_game_settings(&mut self, settings: GameSettings) {
        if self.session.role() == Some(PeerRole::Owner) {
            log::warn!("Ignoring game settings from the joiner: {settings:?}");
            return;
        }
        let config = MatchConfig {
            time_control: TimeControl::from_secs(settings.time_control_seconds),
            local_force: settings.assigned_color_for_recipient,
        };
        log::info!(
            "Game started by the room owner: {} per move, playing {}",
            config.time_control,
            config.local_force
        );
        self.session.set_config(config);
        self.session.set_phase(MatchPhase::InProgress);
        self.init_game();
        self.start_clock();
    }

    // Applied without a local turn check: the sender has already validated the move against its
    // own copy of the position, and a failure here means the two copies diverged.
    fn apply_remote_move(&mut self, mv: TurnMove) {
        match self.session.phase() {
            MatchPhase::InProgress | MatchPhase::Finished(_) => {}
            MatchPhase::WaitingForPeer | MatchPhase::WaitingForStart => {
                log::warn!("Ignoring remote move {mv:?}: no game started");
                return;
            }
        }
        let moved = self.game.active_force();
        match self.game.try_move(mv) {
            Ok(_) => self.after_move(moved),
            Err(err) => {
                log::error!("Remote move {mv:?} rejected: {err:?}; position {}", self.game.fen());
                self.notifier.notify(
                    "Desync",
                    &format!("The peer made a move that is not legal here: {}{}", mv.from, mv.to),
                    Severity::Error,
                );
            }
        }
    }

    fn after_move(&mut self, moved: Force) {
        self.board.set_position(&self.game.fen());
        self.update_status();
        self.clock.switch_turn(moved);
        self.show_clocks();
    }

    fn on_tick(&mut self, generation: TickGeneration) {
        let active_force = self.game.active_force();
        match self.clock.tick(generation, active_force) {
            TickOutcome::Ignored => log::trace!("Stale tick {generation:?}"),
            TickOutcome::Ticked(force) => self.show_clock(force),
            TickOutcome::Flag(loser) => {
                self.show_clock(loser);
                self.ticker.stop();
                let winner = loser.opponent();
                log::info!("{loser} ran out of time");
                if self.session.phase() == MatchPhase::InProgress {
                    self.session.set_phase(MatchPhase::Finished(FinishReason::Timeout { winner }));
                }
                self.board.set_status(&format!("Game over, {winner} wins on time."));
                self.notifier.notify("Game Over", &format!("{winner} wins on time!"), Severity::Info);
            }
        }
    }

    fn init_game(&mut self) {
        self.game.reset();
        self.board.set_orientation(self.session.local_force());
        self.board.set_position(&self.game.fen());
        self.update_status();
    }

    fn update_status(&mut self) {
        let status = self.game.status();
        let side = self.game.active_force();
        let text = match status {
            ChessGameStatus::Active if self.game.is_check() => {
                format!("{side} to move, {side} is in check")
            }
            ChessGameStatus::Active => format!("{side} to move"),
            ChessGameStatus::Victory(winner, VictoryReason::Checkmate) => {
                format!("Game over, {side} is in checkmate. {winner} wins.")
            }
            ChessGameStatus::Victory(winner, VictoryReason::Flag) => {
                format!("Game over, {winner} wins on time.")
            }
            ChessGameStatus::Draw(_) => "Game over, drawn position".to_owned(),
        };
        self.board.set_status(&text);

        let finish_reason = match status {
            ChessGameStatus::Active => None,
            ChessGameStatus::Victory(winner, VictoryReason::Checkmate) => {
                Some(FinishReason::Checkmate { winner })
            }
            ChessGameStatus::Victory(winner, VictoryReason::Flag) => {
                Some(FinishReason::Timeout { winner })
            }
            ChessGameStatus::Draw(reason) => Some(FinishReason::Draw(reason)),
        };
        if let Some(reason) = finish_reason {
            if self.session.phase() == MatchPhase::InProgress {
                log::info!("Game over: {reason:?}");
                self.session.set_phase(MatchPhase::Finished(reason));
                self.stop_clock();
            }
        }
    }

    fn start_clock(&mut self) {
        let generation = self.ticker.restart();
        self.clock.start(self.session.config().time_control, generation);
        self.board.set_clocks_visible(true);
        self.show_clocks();
    }

    fn stop_clock(&mut self) {
        self.clock.stop();
        self.ticker.stop();
    }

    fn show_clock(&mut self, force: Force) {
        let showing = self.clock.showing_for(force);
        self.board.show_clock(force, &showing);
    }

    fn show_clocks(&mut self) {
        for force in Force::iter() {
            self.show_clock(force);
        }
    }

    fn report_error(&mut self, err: &SessionError) {
        log::warn!("{err}");
        self.notifier.notify(err.title(), &err.to_string(), Severity::Error);
    }
}
