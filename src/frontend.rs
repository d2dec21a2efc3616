// What the match controller needs from the user-facing side. Both traits are output-only: user
// input comes back in through `IncomingEvent::Ui` or direct controller calls.

use crate::force::Force;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Success,
    Error,
    Info,
}

pub trait Notifier {
    fn notify(&mut self, title: &str, text: &str, severity: Severity);
}

pub trait BoardView {
    // The address other peers can use to connect to us. Meant for out-of-band sharing.
    fn show_local_address(&mut self, address: &str);
    fn set_orientation(&mut self, orientation: Force);
    fn set_position(&mut self, fen: &str);
    fn set_status(&mut self, status: &str);
    fn set_clocks_visible(&mut self, visible: bool);
    fn show_clock(&mut self, force: Force, showing: &str);
}
