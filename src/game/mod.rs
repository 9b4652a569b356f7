//! Board engine: Awalé rules and board rendering

pub mod board;
pub mod render;

pub use board::{Board, MoveOutcome, DEFAULT_SEEDS_PER_PIT, PITS_PER_SIDE, PIT_COUNT};
pub use render::{render, render_with_names};
