// Only the parts of FEN needed to render a position received from the rules engine.

use crate::coord::{Col, Coord, NUM_COLS, NUM_ROWS, Row};
use crate::grid::Grid;
use crate::piece::piece_from_ascii;


pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub fn fen_to_grid(fen: &str) -> Result<Grid, String> {
    let placement = fen.split_ascii_whitespace().next().ok_or_else(|| "empty FEN".to_owned())?;
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != NUM_ROWS as usize {
        return Err(format!("expected {} rows, got {}", NUM_ROWS, rows.len()));
    }
    let mut grid = Grid::new();
    // FEN lists rows from the 8th down to the 1st.
    for (row, row_str) in Row::all().rev().zip(rows) {
        let mut col_idx: u8 = 0;
        for ch in row_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                col_idx = col_idx.saturating_add(skip as u8);
            } else {
                let piece = piece_from_ascii(ch).ok_or_else(|| format!("invalid piece: {}", ch))?;
                let col = Col::from_zero_based(col_idx)
                    .ok_or_else(|| format!("row too long: {}", row_str))?;
                grid[Coord::new(row, col)] = Some(piece);
                col_idx += 1;
            }
        }
        if col_idx != NUM_COLS {
            return Err(format!("row has {} columns: {}", col_idx, row_str));
        }
    }
    Ok(grid)
}
