// Line-based console peer. Everything the user types is turned into a `UiCommand` and goes
// through the same queue as network events and clock ticks.

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use console::Term;
use peer_chess::chess::ChessGame;
use peer_chess::clock::TICK_PERIOD;
use peer_chess::coord::parse_coord_pair;
use peer_chess::match_controller::{IncomingEvent, MatchController, UiCommand};
use peer_chess::rules::{ColorChoice, MatchConfig, SettingsInput};
use peer_chess::ticker::ThreadTicker;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::network::{self, WsConnector};
use crate::peer_config::PeerConfig;
use crate::tui::{ConsoleBoard, ConsoleNotifier};


const HELP: &str = "\
Commands:
  connect <address>                   join the room owner at <address>
  settings <minutes> <white|black|random>
                                      time per move and your color (room owner only)
  start                               start the game (room owner only)
  <from><to>                          make a move, e.g. e2e4
  quit                                leave";


pub struct PeerRunConfig {
    pub peer_config: PeerConfig,
    pub connect_to: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum ParsedLine {
    Empty,
    Help,
    Command(UiCommand),
}

fn parse_line(line: &str) -> Result<ParsedLine, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(ParsedLine::Empty),
        ["help"] => return Ok(ParsedLine::Help),
        ["quit" | "exit"] => UiCommand::Leave,
        ["start"] => UiCommand::StartGame,
        ["connect"] => UiCommand::Connect { remote_address: String::new() },
        ["connect", address] => UiCommand::Connect { remote_address: (*address).to_owned() },
        ["settings", minutes, color] => {
            let color = ColorChoice::from_str_loose(color)
                .ok_or_else(|| format!("Unknown color '{color}': expected white, black or random"))?;
            UiCommand::ApplySettings(SettingsInput {
                time_control_minutes: (*minutes).to_owned(),
                color,
            })
        }
        [mv] => match parse_coord_pair(mv) {
            Some((from, to)) => UiCommand::DropPiece { from, to },
            None => return Err(format!("Unknown command: '{}'. Type 'help' for help.", line.trim())),
        },
        _ => return Err(format!("Unknown command: '{}'. Type 'help' for help.", line.trim())),
    };
    Ok(ParsedLine::Command(command))
}

pub fn run(config: PeerRunConfig) -> anyhow::Result<()> {
    let time_control = config.peer_config.time_control()?;
    let term = Term::stdout();

    let (tx, rx) = mpsc::channel();
    network::listen(&config.peer_config.listen_address, tx.clone())?;

    let tx_tick = tx.clone();
    let ticker = ThreadTicker::new(TICK_PERIOD, move |generation| {
        let _ = tx_tick.send(IncomingEvent::Tick(generation));
    });
    let board = ConsoleBoard::new();
    let mut controller = MatchController::new(
        MatchConfig::new(time_control),
        Box::new(ChessGame::new()),
        Box::new(board.clone()),
        Box::new(ConsoleNotifier::new(term.clone())),
        Box::new(ticker),
        Box::new(WsConnector::new(tx.clone())),
        StdRng::from_os_rng(),
    );

    let tx_local = tx.clone();
    let term_local = term.clone();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match parse_line(&line) {
                Ok(ParsedLine::Empty) => continue,
                Ok(ParsedLine::Help) => {
                    let _ = term_local.write_line(HELP);
                    continue;
                }
                Ok(ParsedLine::Command(command)) => command,
                Err(message) => {
                    let _ = term_local.write_line(&message);
                    continue;
                }
            };
            let quit = command == UiCommand::Leave;
            if tx_local.send(IncomingEvent::Ui(command)).is_err() || quit {
                return;
            }
        }
        // End of input.
        let _ = tx_local.send(IncomingEvent::Ui(UiCommand::Leave));
    });

    if let Some(remote_address) = config.connect_to {
        tx.send(IncomingEvent::Ui(UiCommand::Connect { remote_address }))
            .map_err(|_| anyhow::anyhow!("Event loop is gone"))?;
    }
    drop(tx);

    term.write_line(HELP)?;
    for event in rx {
        let quit = matches!(event, IncomingEvent::Ui(UiCommand::Leave));
        controller.apply_event(event);
        board.flush(&term)?;
        if quit {
            log::info!("Bye");
            return Ok(());
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use peer_chess::coord::Coord;
    use pretty_assertions::assert_eq;

    use super::*;

    fn sq(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }

    #[test]
    fn parse_commands() {
        assert_eq!(parse_line("   "), Ok(ParsedLine::Empty));
        assert_eq!(parse_line("help"), Ok(ParsedLine::Help));
        assert_eq!(parse_line("quit"), Ok(ParsedLine::Command(UiCommand::Leave)));
        assert_eq!(parse_line(" start "), Ok(ParsedLine::Command(UiCommand::StartGame)));
        assert_eq!(
            parse_line("connect 10.0.0.2:38617"),
            Ok(ParsedLine::Command(UiCommand::Connect {
                remote_address: "10.0.0.2:38617".to_owned()
            }))
        );
        assert_eq!(
            parse_line("settings 5 black"),
            Ok(ParsedLine::Command(UiCommand::ApplySettings(SettingsInput {
                time_control_minutes: "5".to_owned(),
                color: ColorChoice::Black,
            })))
        );
        assert_eq!(
            parse_line("e2e4"),
            Ok(ParsedLine::Command(UiCommand::DropPiece { from: sq("e2"), to: sq("e4") }))
        );
    }

    #[test]
    fn bad_commands() {
        assert!(parse_line("settings 5 green").is_err());
        assert!(parse_line("settings 5").is_err());
        assert!(parse_line("e2e9").is_err());
        assert!(parse_line("resign").is_err());
    }

    #[test]
    fn minutes_are_validated_later() {
        // Bad minutes are reported by the controller as an invalid-input error.
        assert_eq!(
            parse_line("settings soon white"),
            Ok(ParsedLine::Command(UiCommand::ApplySettings(SettingsInput {
                time_control_minutes: "soon".to_owned(),
                color: ColorChoice::White,
            })))
        );
    }
}
