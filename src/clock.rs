// Improvement potential. Synchronize clocks over the wire. Each peer runs its own countdown and
//   relies on both sides ticking at roughly the same wall-clock moments, so the two clocks can
//   drift apart by up to a second per move plus network latency.

use std::fmt;
use std::time::Duration;

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::force::Force;
use crate::ticker::TickGeneration;


pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimeControl {
    // Must be a whole number of seconds.
    pub starting_time: Duration,
}

impl TimeControl {
    pub fn from_secs(secs: u64) -> Self {
        TimeControl {
            starting_time: Duration::from_secs(secs),
        }
    }
    pub fn as_secs(self) -> u64 { self.starting_time.as_secs() }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_duration_to_mmss(self.starting_time, f)
    }
}

pub fn duration_to_mmss(d: Duration) -> String {
    let mut ret = String::new();
    // Writing to a `String` never fails.
    let _ = format_duration_to_mmss(d, &mut ret);
    ret
}

fn format_duration_to_mmss(d: Duration, f: &mut impl fmt::Write) -> fmt::Result {
    let s = d.as_secs();
    let minutes = s / 60;
    let seconds = s % 60;
    write!(f, "{minutes:02}:{seconds:02}")
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    // Tick from a stopped or superseded run.
    Ignored,
    Ticked(Force),
    // The force ran out of time. The clock is stopped.
    Flag(Force),
}

// Refill clock. Only the side to move is running down, and the side that has just moved is
// refilled to the full time control. This is not a standard chess clock: there is no way to
// bank time across moves.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clock {
    control: TimeControl,
    remaining_time: EnumMap<Force, Duration>,
    // Set while running. Ticks carrying any other generation are stale.
    generation: Option<TickGeneration>,
}

impl Clock {
    pub fn new(control: TimeControl) -> Self {
        Clock {
            control,
            remaining_time: enum_map! { _ => control.starting_time },
            generation: None,
        }
    }

    pub fn is_running(&self) -> bool { self.generation.is_some() }
    pub fn time_left(&self, force: Force) -> Duration { self.remaining_time[force] }
    pub fn showing_for(&self, force: Force) -> String { duration_to_mmss(self.time_left(force)) }

    // Resets both sides to the full time. Any previous run is superseded.
    pub fn start(&mut self, control: TimeControl, generation: TickGeneration) {
        self.control = control;
        self.remaining_time = enum_map! { _ => control.starting_time };
        self.generation = Some(generation);
    }

    // Changes time control without starting. Both sides are reset.
    pub fn reset(&mut self, control: TimeControl) {
        self.control = control;
        self.remaining_time = enum_map! { _ => control.starting_time };
        self.generation = None;
    }

    pub fn tick(&mut self, generation: TickGeneration, active_force: Force) -> TickOutcome {
        if self.generation != Some(generation) {
            return TickOutcome::Ignored;
        }
        let remaining = &mut self.remaining_time[active_force];
        *remaining = remaining.saturating_sub(TICK_PERIOD);
        if remaining.is_zero() {
            self.generation = None;
            TickOutcome::Flag(active_force)
        } else {
            TickOutcome::Ticked(active_force)
        }
    }

    pub fn switch_turn(&mut self, moved: Force) {
        if self.is_running() {
            self.remaining_time[moved] = self.control.starting_time;
        }
    }

    pub fn stop(&mut self) { self.generation = None; }

    #[allow(non_snake_case)]
    pub fn TEST_set_time_left(&mut self, force: Force, time: Duration) {
        self.remaining_time[force] = time;
    }
}
