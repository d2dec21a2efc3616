// Improvement potential. Use `crossterm` and redraw the board in place instead of printing a new
//   one after every change. Then clocks could be shown live: currently they only show up together
//   with the board.

use std::cell::RefCell;
use std::rc::Rc;

use console::{Style, Term};
use enum_map::EnumMap;
use itertools::Itertools;
use peer_chess::coord::{Col, Coord, Row};
use peer_chess::fen::fen_to_grid;
use peer_chess::force::Force;
use peer_chess::frontend::{BoardView, Notifier, Severity};
use peer_chess::grid::Grid;
use peer_chess::piece::piece_to_pictogram;


#[derive(Clone, Debug, Default)]
struct BoardState {
    // Shown once, on the next flush.
    new_local_address: Option<String>,
    orientation: Option<Force>,
    fen: Option<String>,
    status: String,
    clocks_visible: bool,
    clocks: EnumMap<Force, String>,
    // Clock changes alone do not trigger a render.
    dirty: bool,
}

// Collects updates from the match controller; the event loop calls `flush` once per event.
#[derive(Clone, Default)]
pub struct ConsoleBoard {
    state: Rc<RefCell<BoardState>>,
}

impl ConsoleBoard {
    pub fn new() -> Self { Self::default() }

    pub fn flush(&self, term: &Term) -> std::io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(address) = state.new_local_address.take() {
            term.write_line(&format!("Your address: {}", Style::new().bold().apply_to(address)))?;
        }
        if !state.dirty {
            return Ok(());
        }
        state.dirty = false;
        if let Some(fen) = &state.fen {
            let orientation = state.orientation.unwrap_or(Force::White);
            match fen_to_grid(fen) {
                Ok(grid) => term.write_line(&render_grid(&grid, orientation))?,
                Err(err) => log::error!("Cannot render position {fen:?}: {err}"),
            }
        }
        if !state.status.is_empty() {
            term.write_line(&state.status)?;
        }
        if state.clocks_visible {
            term.write_line(&render_clocks(&state.clocks))?;
        }
        Ok(())
    }
}

impl BoardView for ConsoleBoard {
    fn show_local_address(&mut self, address: &str) {
        self.state.borrow_mut().new_local_address = Some(address.to_owned());
    }
    fn set_orientation(&mut self, orientation: Force) {
        let mut state = self.state.borrow_mut();
        state.orientation = Some(orientation);
        state.dirty = true;
    }
    fn set_position(&mut self, fen: &str) {
        let mut state = self.state.borrow_mut();
        state.fen = Some(fen.to_owned());
        state.dirty = true;
    }
    fn set_status(&mut self, status: &str) {
        let mut state = self.state.borrow_mut();
        if state.status != status {
            state.status = status.to_owned();
            state.dirty = true;
        }
    }
    fn set_clocks_visible(&mut self, visible: bool) {
        let mut state = self.state.borrow_mut();
        state.clocks_visible = visible;
        state.dirty = true;
    }
    fn show_clock(&mut self, force: Force, showing: &str) {
        let mut state = self.state.borrow_mut();
        state.clocks[force] = showing.to_owned();
    }
}


pub struct ConsoleNotifier {
    term: Term,
}

impl ConsoleNotifier {
    pub fn new(term: Term) -> Self { ConsoleNotifier { term } }
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, title: &str, text: &str, severity: Severity) {
        let style = match severity {
            Severity::Success => Style::new().green(),
            Severity::Error => Style::new().red(),
            Severity::Info => Style::new().cyan(),
        };
        let line = format!("{} {}", style.bold().apply_to(format!("[{title}]")), text);
        if let Err(err) = self.term.write_line(&line) {
            log::error!("Cannot show notification {line:?}: {err}");
        }
    }
}


fn render_clocks(clocks: &EnumMap<Force, String>) -> String {
    clocks.iter().map(|(force, showing)| format!("{force}: {showing}")).join("    ")
}

// Rows go top to bottom as seen by the player at the bottom of the board.
fn display_rows(orientation: Force) -> Vec<Row> {
    match orientation {
        Force::White => Row::all().rev().collect(),
        Force::Black => Row::all().collect(),
    }
}

fn display_cols(orientation: Force) -> Vec<Col> {
    match orientation {
        Force::White => Col::all().collect(),
        Force::Black => Col::all().rev().collect(),
    }
}

pub fn render_grid(grid: &Grid, orientation: Force) -> String {
    let colors = [
        Style::new().color256(233).on_color256(222),
        Style::new().color256(233).on_color256(230),
    ];
    let rows = display_rows(orientation);
    let cols = display_cols(orientation);
    let col_header = format!(
        "{}{}",
        format_square(' '),
        cols.iter().map(|col| format_square(col.to_algebraic())).join("")
    );
    let mut ret = String::new();
    ret.push_str(&col_header);
    ret.push('\n');
    for &row in &rows {
        ret.push_str(&format_square(row.to_algebraic()));
        for &col in &cols {
            let coord = Coord::new(row, col);
            let color_idx = (row.to_zero_based() + col.to_zero_based()) % 2;
            let square = format_square(match grid[coord] {
                Some(piece) => piece_to_pictogram(piece.kind, piece.force),
                None => ' ',
            });
            ret.push_str(&colors[usize::from(color_idx)].apply_to(square).to_string());
        }
        ret.push_str(&format_square(row.to_algebraic()));
        ret.push('\n');
    }
    ret.push_str(&col_header);
    ret
}

fn format_square(ch: char) -> String { format!(" {} ", ch) }


#[cfg(test)]
mod tests {
    use peer_chess::fen::STARTING_FEN;

    use super::*;

    fn plain(s: &str) -> String { console::strip_ansi_codes(s).into_owned() }

    #[test]
    fn white_at_the_bottom() {
        let grid = fen_to_grid(STARTING_FEN).unwrap();
        let rendered = plain(&render_grid(&grid, Force::White));
        let lines = rendered.lines().collect_vec();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0].split_whitespace().join(""), "abcdefgh");
        assert_eq!(lines[1].split_whitespace().join(""), "8♜♞♝♛♚♝♞♜8");
        assert_eq!(lines[8].split_whitespace().join(""), "1♖♘♗♕♔♗♘♖1");
    }

    #[test]
    fn black_at_the_bottom() {
        let grid = fen_to_grid(STARTING_FEN).unwrap();
        let rendered = plain(&render_grid(&grid, Force::Black));
        let lines = rendered.lines().collect_vec();
        assert_eq!(lines[0].split_whitespace().join(""), "hgfedcba");
        assert_eq!(lines[1].split_whitespace().join(""), "1♖♘♗♔♕♗♘♖1");
        assert_eq!(lines[8].split_whitespace().join(""), "8♜♞♝♚♛♝♞♜8");
    }

    #[test]
    fn clocks_line() {
        let mut clocks = EnumMap::default();
        clocks[Force::White] = "05:00".to_owned();
        clocks[Force::Black] = "04:59".to_owned();
        assert_eq!(render_clocks(&clocks), "White: 05:00    Black: 04:59");
    }
}
