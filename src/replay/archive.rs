//! Game archive interfaces
//!
//! A game log is a sequence of text blocks: header, initial board, one block
//! per move, and the result. Readers consume it front to back; going back
//! means reopening it.

use crate::error::ArenaResult;
use chrono::{DateTime, Utc};

/// Line separating two blocks in a stored log
pub const BLOCK_SEPARATOR: &str = "%%";

/// Extension of a completed game log
pub const LOG_EXTENSION: &str = ".log";

/// Sequential reader over one game log
pub trait GameLog: Send {
    /// Next block, or `None` once the log is exhausted
    fn next_block(&mut self) -> ArenaResult<Option<String>>;
}

/// Appends blocks to a game log as the game is played
pub trait GameLogWriter: Send {
    /// Name the log will be listed under once finished
    fn file_name(&self) -> &str;

    /// Append one block
    fn append_block(&mut self, block: &str) -> ArenaResult<()>;

    /// Append the result block and publish the log as completed
    fn finish(&mut self, result: &str) -> ArenaResult<()>;
}

/// Source of replay logs and sink for new ones
pub trait GameArchive: Send + Sync {
    /// Names of every log whose result block has been written
    fn list_completed_games(&self) -> ArenaResult<Vec<String>>;

    /// Open a completed log for reading from its first block
    fn open_game_log(&self, file_name: &str) -> ArenaResult<Box<dyn GameLog>>;

    /// Start recording a new game between two players
    fn create_log(
        &self,
        players: [&str; 2],
        started_at: DateTime<Utc>,
    ) -> ArenaResult<Box<dyn GameLogWriter>>;
}

/// Canonical log name: `<YYYYmmdd-HHMMSS>_<player0>_vs_<player1>.log`
pub fn log_file_name(players: [&str; 2], started_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_vs_{}{}",
        started_at.format("%Y%m%d-%H%M%S"),
        players[0],
        players[1],
        LOG_EXTENSION
    )
}

/// Accept only plain file names ending in `.log`
pub fn is_valid_log_name(file_name: &str) -> bool {
    file_name.len() > LOG_EXTENSION.len()
        && file_name.ends_with(LOG_EXTENSION)
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '/' && c != '\\')
}
