use std::time::Duration;

use anyhow::Context;
use peer_chess::clock::TimeControl;
use serde::{Deserialize, Serialize};

use crate::network;


#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    pub listen_address: String,

    // Time per move until the room owner changes it. Whole seconds only.
    #[serde(with = "humantime_serde")]
    pub default_time_control: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            listen_address: format!("0.0.0.0:{}", network::DEFAULT_PORT),
            default_time_control: Duration::from_secs(10 * 60),
        }
    }
}

impl PeerConfig {
    pub fn time_control(&self) -> anyhow::Result<TimeControl> {
        let secs = self.default_time_control.as_secs();
        anyhow::ensure!(
            secs > 0 && self.default_time_control.subsec_nanos() == 0,
            "default_time_control must be a positive whole number of seconds, got {:?}",
            self.default_time_control
        );
        Ok(TimeControl::from_secs(secs))
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<PeerConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Reading config file '{path}'"))?;
    parse_config(&contents).with_context(|| format!("Parsing config file '{path}'"))
}

fn parse_config(contents: &str) -> anyhow::Result<PeerConfig> {
    let config: PeerConfig = serde_yaml::from_str(contents)?;
    config.time_control()?;
    Ok(config)
}
