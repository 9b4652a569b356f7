//! Text rendering of a board
//!
//! The second seat's row is printed on top from pit 11 down to pit 6 so that
//! sowing reads counter-clockwise around the two rows.

use super::board::{Board, PITS_PER_SIDE, PIT_COUNT};
use crate::types::Seat;
use std::fmt::Write;

const BORDER: &str = "     +---+---+---+---+---+---+";

fn row(board: &Board, pits: impl Iterator<Item = usize>) -> String {
    let mut line = String::from("|");
    for pit in pits {
        let _ = write!(line, "{:>2} |", board.seeds(pit));
    }
    line
}

/// Render a board with its score line, naming the seats `P1`/`P2`
pub fn render(board: &Board) -> String {
    render_with_names(board, [&Seat::First.to_string(), &Seat::Second.to_string()])
}

/// Render a board with player names on the score line
pub fn render_with_names(board: &Board, names: [&str; 2]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "       6   5   4   3   2   1");
    let _ = writeln!(out, "{BORDER}");
    let _ = writeln!(
        out,
        "P2   {}",
        row(board, (PITS_PER_SIDE..PIT_COUNT).rev())
    );
    let _ = writeln!(out, "{BORDER}");
    let _ = writeln!(out, "P1   {}", row(board, 0..PITS_PER_SIDE));
    let _ = writeln!(out, "{BORDER}");
    let _ = writeln!(out, "       1   2   3   4   5   6");
    let _ = write!(
        out,
        "Score {} (P1): {} | {} (P2): {}",
        names[0],
        board.score(Seat::First),
        names[1],
        board.score(Seat::Second)
    );
    out
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render(self))
    }
}
