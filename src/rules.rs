use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::TimeControl;
use crate::error::SessionError;
use crate::force::Force;


pub const DEFAULT_TIME_CONTROL: TimeControl = TimeControl {
    starting_time: Duration::from_secs(10 * 60),
};

// Each peer holds its own copy. Once a game starts the two copies mirror each other: same time
// control, opposite forces.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    pub time_control: TimeControl,
    pub local_force: Force,
}

impl MatchConfig {
    pub fn new(time_control: TimeControl) -> Self {
        MatchConfig { time_control, local_force: Force::White }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ColorChoice {
    White,
    Black,
    Random,
}

impl ColorChoice {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Some(ColorChoice::White),
            "black" | "b" => Some(ColorChoice::Black),
            "random" | "r" => Some(ColorChoice::Random),
            _ => None,
        }
    }

    pub fn resolve(self, rng: &mut impl Rng) -> Force {
        match self {
            ColorChoice::White => Force::White,
            ColorChoice::Black => Force::Black,
            ColorChoice::Random => {
                if rng.random_bool(0.5) { Force::White } else { Force::Black }
            }
        }
    }
}

// Raw owner input, as typed by the user.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SettingsInput {
    pub time_control_minutes: String,
    pub color: ColorChoice,
}

// Minutes are truncated to a whole number: "5.9" means five minutes.
pub fn parse_time_control_minutes(s: &str) -> Result<TimeControl, SessionError> {
    let invalid = || SessionError::InvalidInput(format!("Invalid time control: '{}'", s.trim()));
    let minutes: f64 = s.trim().parse().map_err(|_| invalid())?;
    if !minutes.is_finite() || minutes.trunc() < 1.0 || minutes.trunc() > u32::MAX as f64 {
        return Err(invalid());
    }
    let minutes = minutes.trunc() as u64;
    Ok(TimeControl::from_secs(minutes * 60))
}
