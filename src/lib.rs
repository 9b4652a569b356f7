//! Awalé Arena - a line-protocol Awalé server
//!
//! Players connect over TCP with a plain-text protocol, challenge each other
//! from a lobby, play Awalé under the capture and famine rules, watch other
//! games, replay recorded ones and climb an ELO ladder.

pub mod config;
pub mod error;
pub mod game;
pub mod metrics;
pub mod profile;
pub mod rating;
pub mod replay;
pub mod room;
pub mod server;
pub mod service;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{ArenaError, ArenaResult, MoveRejection, Result};
pub use types::*;

// Re-export key components
pub use game::Board;
pub use profile::{InMemoryProfileStore, ProfileStore};
pub use replay::{GameArchive, InMemoryArchive};
pub use server::{ArenaEvent, Dispatcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
