//! Profile store interface
//!
//! Bios, ELO ratings and friendships keyed by display name. Handlers call
//! the store synchronously; every failure is reported as
//! [`ArenaError::StoreUnavailable`](crate::error::ArenaError) and handled as
//! "no data" by the caller.

use crate::error::ArenaResult;

/// Longest bio accepted, in bytes
pub const MAX_BIO_LENGTH: usize = 256;

/// Default rating of a player the store has never seen
pub const DEFAULT_ELO: i32 = 1000;

/// Persistent player profiles
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore: Send + Sync {
    /// Bio of a player, if one was set
    fn get_bio(&self, name: &str) -> ArenaResult<Option<String>>;

    /// Set or replace a player's bio
    fn set_bio(&self, name: &str, bio: &str) -> ArenaResult<()>;

    /// Current rating, the initial rating if none is stored
    fn get_elo(&self, name: &str) -> ArenaResult<i32>;

    /// Add `delta` to a player's rating and return the new value
    fn adjust_elo(&self, name: &str, delta: i32) -> ArenaResult<i32>;

    /// True if `a` and `b` are friends (symmetric)
    fn are_friends(&self, a: &str, b: &str) -> ArenaResult<bool>;

    /// Record a request from `from` to `to`
    ///
    /// Returns false when nothing changed: the request is already pending or
    /// the two are already friends.
    fn send_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool>;

    /// Names with a pending request addressed to `name`
    fn pending_requests_for(&self, name: &str) -> ArenaResult<Vec<String>>;

    /// Accept the request `from` sent to `to`, making them friends
    ///
    /// Returns false if no such request was pending.
    fn accept_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool>;

    /// Friends of a player, sorted
    fn friends_of(&self, name: &str) -> ArenaResult<Vec<String>>;
}

/// Check a bio line: printable ASCII, no separators, bounded length
pub fn is_valid_bio(bio: &str) -> bool {
    !bio.is_empty()
        && bio.len() <= MAX_BIO_LENGTH
        && bio.chars().all(|c| (c.is_ascii_graphic() || c == ' ') && c != '|')
}
