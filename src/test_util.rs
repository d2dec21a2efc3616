// Test utilities that cannot be moved to the "tests" folder, because unit tests use them too.
//
// The fakes share their state through `Rc<RefCell<...>>` handles: the test keeps one clone and
// hands another one to the match controller.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use enum_map::EnumMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::force::Force;
use crate::frontend::{BoardView, Notifier, Severity};
use crate::network::{ChannelId, Connector, PeerChannel, TransportError};
use crate::ticker::{TickDriver, TickGeneration};


// In theory random tests verify statistical properties that should always hold, but let's fix
// the seed to avoid sporadic failures.
pub fn deterministic_rng() -> StdRng { StdRng::from_seed([0; 32]) }


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub severity: Severity,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self { Self::default() }
    pub fn notifications(&self) -> Ref<'_, Vec<Notification>> { self.log.borrow() }
    pub fn titles(&self) -> Vec<String> {
        self.log.borrow().iter().map(|n| n.title.clone()).collect()
    }
    pub fn last(&self) -> Option<Notification> { self.log.borrow().last().cloned() }
    pub fn clear(&self) { self.log.borrow_mut().clear(); }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, title: &str, text: &str, severity: Severity) {
        self.log.borrow_mut().push(Notification {
            title: title.to_owned(),
            text: text.to_owned(),
            severity,
        });
    }
}


#[derive(Clone, Default, Debug)]
pub struct BoardRecord {
    pub local_address: Option<String>,
    pub orientation: Option<Force>,
    pub position: Option<String>,
    pub position_updates: usize,
    pub status: String,
    pub clocks_visible: bool,
    pub clocks: EnumMap<Force, String>,
}

#[derive(Clone, Default)]
pub struct RecordingBoard {
    record: Rc<RefCell<BoardRecord>>,
}

impl RecordingBoard {
    pub fn new() -> Self { Self::default() }
    pub fn record(&self) -> Ref<'_, BoardRecord> { self.record.borrow() }
}

impl BoardView for RecordingBoard {
    fn show_local_address(&mut self, address: &str) {
        self.record.borrow_mut().local_address = Some(address.to_owned());
    }
    fn set_orientation(&mut self, orientation: Force) {
        self.record.borrow_mut().orientation = Some(orientation);
    }
    fn set_position(&mut self, fen: &str) {
        let mut record = self.record.borrow_mut();
        record.position = Some(fen.to_owned());
        record.position_updates += 1;
    }
    fn set_status(&mut self, status: &str) { self.record.borrow_mut().status = status.to_owned(); }
    fn set_clocks_visible(&mut self, visible: bool) {
        self.record.borrow_mut().clocks_visible = visible;
    }
    fn show_clock(&mut self, force: Force, showing: &str) {
        self.record.borrow_mut().clocks[force] = showing.to_owned();
    }
}


#[derive(Clone, Copy, Default, Debug)]
pub struct ManualTickerState {
    pub running: Option<TickGeneration>,
    pub restarts: u64,
    pub stops: u64,
}

// Never ticks on its own: the test delivers `IncomingEvent::Tick` with the current generation.
#[derive(Clone, Default)]
pub struct ManualTicker {
    state: Rc<RefCell<ManualTickerState>>,
}

impl ManualTicker {
    pub fn new() -> Self { Self::default() }
    pub fn state(&self) -> ManualTickerState { *self.state.borrow() }
    pub fn current(&self) -> Option<TickGeneration> { self.state.borrow().running }
}

impl TickDriver for ManualTicker {
    fn restart(&mut self) -> TickGeneration {
        let mut state = self.state.borrow_mut();
        state.restarts += 1;
        let generation = TickGeneration::new(state.restarts);
        state.running = Some(generation);
        generation
    }
    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.running.take().is_some() {
            state.stops += 1;
        }
    }
}


#[derive(Clone, Default)]
pub struct RecordingConnector {
    attempts: Rc<RefCell<Vec<String>>>,
}

impl RecordingConnector {
    pub fn new() -> Self { Self::default() }
    pub fn attempts(&self) -> Vec<String> { self.attempts.borrow().clone() }
}

impl Connector for RecordingConnector {
    fn connect(&mut self, remote_address: &str) {
        self.attempts.borrow_mut().push(remote_address.to_owned());
    }
}


// In-memory channel. Whatever is sent ends up in the tap, from where the test forwards it to the
// other peer.
#[derive(Debug)]
pub struct LoopbackChannel {
    id: ChannelId,
    tap: ChannelTap,
}

#[derive(Clone, Default, Debug)]
pub struct ChannelTap {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl LoopbackChannel {
    pub fn new(id: ChannelId) -> (Self, ChannelTap) {
        let tap = ChannelTap::default();
        (LoopbackChannel { id, tap: tap.clone() }, tap)
    }
}

impl ChannelTap {
    pub fn take_sent(&self) -> Vec<String> { std::mem::take(&mut *self.sent.lock().unwrap()) }
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }
}

impl PeerChannel for LoopbackChannel {
    fn id(&self) -> ChannelId { self.id }
    fn send(&mut self, data: String) -> Result<(), TransportError> {
        if self.tap.is_closed() {
            return Err(TransportError::ChannelClosed);
        }
        self.tap.sent.lock().unwrap().push(data);
        Ok(())
    }
    fn close(&mut self) { self.tap.closed.store(true, Ordering::SeqCst); }
}
