// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.
//   * "Rust-upgrade" - place where code can be improved using a Rust feature
//       that is not implemented or stabilized yet.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod network;
pub mod tui;

mod peer_config;
mod peer_main;

use clap::{Command, arg};
use peer_config::PeerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Peer Chess")
        .version(clap::crate_version!())
        .about("Two-player chess over a direct peer-to-peer connection")
        .arg(arg!(--"listen" <address> "Address to accept the other peer on. Overrides the config."))
        .arg(arg!(--"connect" <address> "Address of the room owner to join right away."))
        .arg(arg!(--"config" <config_file> "Path to the configuration file: yaml-serialized PeerConfig."))
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => peer_config::read_config_file(path)?,
        None => PeerConfig::default(),
    };
    if let Some(listen_address) = matches.get_one::<String>("listen") {
        config.listen_address = listen_address.clone();
    }
    peer_main::run(peer_main::PeerRunConfig {
        peer_config: config,
        connect_to: matches.get_one::<String>("connect").cloned(),
    })
}
