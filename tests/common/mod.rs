// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use peer_chess::chess::ChessGame;
use peer_chess::coord::Coord;
use peer_chess::match_controller::{IncomingEvent, MatchController};
use peer_chess::network::ChannelId;
use peer_chess::rules::{DEFAULT_TIME_CONTROL, MatchConfig};
use peer_chess::test_util::{
    ChannelTap, LoopbackChannel, ManualTicker, RecordingBoard, RecordingConnector,
    RecordingNotifier, deterministic_rng,
};


pub const OWNER_ADDRESS: &str = "127.0.0.1:4000";
pub const OWNER_CHANNEL: ChannelId = ChannelId(1);
pub const JOINER_CHANNEL: ChannelId = ChannelId(2);

#[allow(dead_code)]
pub fn sq(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }


// One peer with all its collaborators replaced by recording fakes.
pub struct TestPeer {
    pub controller: MatchController,
    pub board: RecordingBoard,
    pub notifier: RecordingNotifier,
    pub ticker: ManualTicker,
    pub connector: RecordingConnector,
    pub channel: Option<(ChannelId, ChannelTap)>,
}

impl TestPeer {
    pub fn new() -> Self {
        let board = RecordingBoard::new();
        let notifier = RecordingNotifier::new();
        let ticker = ManualTicker::new();
        let connector = RecordingConnector::new();
        let controller = MatchController::new(
            MatchConfig::new(DEFAULT_TIME_CONTROL),
            Box::new(ChessGame::new()),
            Box::new(board.clone()),
            Box::new(notifier.clone()),
            Box::new(ticker.clone()),
            Box::new(connector.clone()),
            deterministic_rng(),
        );
        TestPeer {
            controller,
            board,
            notifier,
            ticker,
            connector,
            channel: None,
        }
    }

    pub fn apply(&mut self, event: IncomingEvent) { self.controller.apply_event(event); }

    // Delivers a tick of the currently running generation. Returns false if the clock is stopped.
    #[allow(dead_code)]
    pub fn tick(&mut self) -> bool {
        match self.ticker.current() {
            Some(generation) => {
                self.apply(IncomingEvent::Tick(generation));
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn position(&self) -> String { self.controller.game().fen() }

    fn take_sent(&self) -> Vec<String> {
        self.channel.as_ref().map(|(_, tap)| tap.take_sent()).unwrap_or_default()
    }

    fn is_channel_closed(&self) -> bool {
        self.channel.as_ref().is_some_and(|(_, tap)| tap.is_closed())
    }
}


pub struct World {
    pub owner: TestPeer,
    pub joiner: TestPeer,
    disconnect_delivered: bool,
}

impl World {
    // Two peers, not connected yet. The owner is listening.
    pub fn new() -> Self {
        let mut owner = TestPeer::new();
        owner.apply(IncomingEvent::HostOpen { local_address: OWNER_ADDRESS.to_owned() });
        World {
            owner,
            joiner: TestPeer::new(),
            disconnect_delivered: false,
        }
    }

    pub fn connected() -> Self {
        let mut world = World::new();
        world.connect();
        world
    }

    // Plays out what a transport does when the joiner dials the owner.
    pub fn connect(&mut self) {
        self.joiner.controller.connect_to(OWNER_ADDRESS).unwrap();
        let (owner_side, owner_tap) = LoopbackChannel::new(OWNER_CHANNEL);
        let (joiner_side, joiner_tap) = LoopbackChannel::new(JOINER_CHANNEL);
        self.owner.channel = Some((OWNER_CHANNEL, owner_tap));
        self.joiner.channel = Some((JOINER_CHANNEL, joiner_tap));
        self.owner.apply(IncomingEvent::IncomingConnection(Box::new(owner_side)));
        self.joiner.apply(IncomingEvent::ConnectionOpened(Box::new(joiner_side)));
    }

    // Delivers everything in flight, in both directions, until both sides are quiet. Returns the
    // delivered messages in delivery order.
    pub fn process_all_events(&mut self) -> Vec<String> {
        let mut delivered = Vec::new();
        loop {
            let from_owner = self.owner.take_sent();
            let from_joiner = self.joiner.take_sent();
            if from_owner.is_empty() && from_joiner.is_empty() {
                break;
            }
            for data in from_owner {
                delivered.push(data.clone());
                self.joiner.apply(IncomingEvent::Data(JOINER_CHANNEL, data));
            }
            for data in from_joiner {
                delivered.push(data.clone());
                self.owner.apply(IncomingEvent::Data(OWNER_CHANNEL, data));
            }
        }
        if !self.disconnect_delivered
            && (self.owner.is_channel_closed() || self.joiner.is_channel_closed())
        {
            self.disconnect_delivered = true;
            self.owner.apply(IncomingEvent::Disconnected(OWNER_CHANNEL));
            self.joiner.apply(IncomingEvent::Disconnected(JOINER_CHANNEL));
        }
        delivered
    }

    // Makes a local move on whichever peer is to move and delivers it.
    #[allow(dead_code)]
    pub fn play(&mut self, moves: &str) {
        for mv in moves.split_whitespace() {
            let (from, to) = peer_chess::coord::parse_coord_pair(mv).unwrap();
            let mover = if self.owner.controller.can_make_local_turn() {
                &mut self.owner
            } else {
                &mut self.joiner
            };
            mover.controller.try_local_move(from, to).unwrap();
            self.process_all_events();
        }
    }
}
