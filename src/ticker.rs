use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;


// Identifies one run of the tick loop. Every restart gets a new generation, so that a tick which
// was already in flight when the loop was restarted can be recognized and dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TickGeneration(u64);

impl TickGeneration {
    pub const fn new(id: u64) -> Self { TickGeneration(id) }
}

// Periodic tick source for the clock. Implementations must guarantee that at most one loop is
// active: `restart` stops the previous loop before starting a new one.
pub trait TickDriver {
    fn restart(&mut self) -> TickGeneration;
    // Safe to call when nothing is running.
    fn stop(&mut self);
}


struct TickLoop {
    // Dropping the sender wakes the thread up and makes it exit.
    stop_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

// One thread per run. The thread waits on the stop channel with a timeout: a timeout means a tick
// is due, anything else means the loop was stopped.
pub struct ThreadTicker {
    period: Duration,
    sink: Arc<dyn Fn(TickGeneration) + Send + Sync>,
    next_generation: u64,
    current: Option<TickLoop>,
}

impl ThreadTicker {
    pub fn new(period: Duration, sink: impl Fn(TickGeneration) + Send + Sync + 'static) -> Self {
        ThreadTicker {
            period,
            sink: Arc::new(sink),
            next_generation: 0,
            current: None,
        }
    }
}

impl TickDriver for ThreadTicker {
    fn restart(&mut self) -> TickGeneration {
        self.stop();
        self.next_generation += 1;
        let generation = TickGeneration(self.next_generation);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let period = self.period;
        let sink = Arc::clone(&self.sink);
        let thread = thread::spawn(move || {
            while let Err(mpsc::RecvTimeoutError::Timeout) = stop_rx.recv_timeout(period) {
                sink(generation);
            }
        });
        self.current = Some(TickLoop { stop_tx, thread });
        generation
    }

    fn stop(&mut self) {
        if let Some(TickLoop { stop_tx, thread }) = self.current.take() {
            drop(stop_tx);
            if thread.join().is_err() {
                log::error!("Tick thread panicked");
            }
        }
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) { self.stop(); }
}
