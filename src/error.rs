//! Error types for the Awalé arena
//!
//! Service wiring (startup, configuration, HTTP) uses anyhow. Everything the
//! game engine can refuse is an [`ArenaError`], which handlers turn into a
//! line of text for the client that caused it.

use crate::types::RoomId;

/// Result type alias for service-level code
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for engine operations
pub type ArenaResult<T> = std::result::Result<T, ArenaError>;

/// Why the board engine refused a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("pit {pit} does not exist")]
    OutOfRange { pit: usize },

    #[error("pit {pit} belongs to your opponent")]
    ForeignPit { pit: usize },

    #[error("pit {pit} is empty")]
    EmptyPit { pit: usize },

    #[error("you must feed your opponent")]
    Famine,

    #[error("the game is already decided")]
    GameOver,
}

/// Everything the arena engine can refuse
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Invalid command: {reason}")]
    Protocol { reason: String },

    #[error("Invalid move: {0}")]
    IllegalMove(#[from] MoveRejection),

    #[error("Capacity exceeded: {resource} is full")]
    CapacityExceeded { resource: String },

    #[error("Player {name} is not available for a duel")]
    TargetUnavailable { name: String },

    #[error("No active game in room {room_id}")]
    RoomNotFound { room_id: RoomId },

    #[error("Room {room_id} is reserved for friends of its players")]
    PrivacyDenied { room_id: RoomId },

    #[error("Storage unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl ArenaError {
    /// Shorthand for a protocol error
    pub fn protocol(reason: impl Into<String>) -> Self {
        ArenaError::Protocol {
            reason: reason.into(),
        }
    }

    /// Shorthand for a storage error built from any displayable cause
    pub fn store(cause: impl std::fmt::Display) -> Self {
        ArenaError::StoreUnavailable {
            message: cause.to_string(),
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ArenaError::Protocol { .. } => "protocol",
            ArenaError::IllegalMove(_) => "illegal_move",
            ArenaError::CapacityExceeded { .. } => "capacity",
            ArenaError::TargetUnavailable { .. } => "target_unavailable",
            ArenaError::RoomNotFound { .. } => "room_not_found",
            ArenaError::PrivacyDenied { .. } => "privacy_denied",
            ArenaError::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(err: std::io::Error) -> Self {
        ArenaError::store(err)
    }
}
