//! Game archive: recording finished games and replaying them
//!
//! Every game is recorded as it is played. Completed logs can be listed and
//! stepped through block by block from the lobby.

pub mod archive;
pub mod cursor;
pub mod directory;
pub mod memory;

pub use archive::{
    is_valid_log_name, log_file_name, GameArchive, GameLog, GameLogWriter, BLOCK_SEPARATOR,
};
pub use cursor::ReplayCursor;
pub use directory::DirectoryArchive;
pub use memory::InMemoryArchive;
