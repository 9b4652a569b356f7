//! Utility functions for the arena

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest display name a client may pick
pub const MAX_NAME_LENGTH: usize = 31;

/// Words that are commands at the prompts where a name is typed
pub const RESERVED_NAMES: &[&str] = &["exit", "accept", "next", "prev", "join"];

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Check that a display name is usable on the wire and in the flat files
///
/// Names are a single printable ASCII token: no whitespace and none of the
/// separators used by the profile files. Prompt keywords are refused so
/// that typing the name never reads as a command.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && !RESERVED_NAMES.contains(&name)
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '|' && c != ',' && c != '/')
}

/// Trim a raw line read from a socket (CR/LF and surrounding spaces)
pub fn clean_line(raw: &str) -> &str {
    raw.trim()
}
