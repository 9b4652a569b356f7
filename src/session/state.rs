//! Session protocol states

use crate::types::{RoomId, Seat};
use serde::{Deserialize, Serialize};

/// Which side of a pending duel a session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelRole {
    Challenger,
    Challenged,
}

/// Free-text prompts opened from the lobby menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptKind {
    /// Next line becomes the session's bio
    Bio,
    /// Next line names the player whose bio to show
    BioTarget,
    /// Next line names the player to send a friend request to
    FriendName,
    /// Next line names the requester whose friend request to accept
    FriendAccept,
}

/// Where a session is in the protocol
///
/// Transitions are only ever made by the dispatcher in response to an
/// inbound line or a cascading room event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Main menu
    #[default]
    Lobby,
    /// Asked to type the name of the player to challenge
    AwaitingOpponentName,
    /// Part of a duel request; the room slot is already reserved
    PendingDuel { room_id: RoomId, role: DuelRole },
    /// Seated in an active room
    InRoom { room_id: RoomId, seat: Seat },
    /// Watching a room
    Observing { room_id: RoomId },
    /// Answering a lobby prompt
    Prompt(PromptKind),
    /// Stepping through a game log
    Replaying,
}

impl SessionState {
    /// Room the state refers to, if any
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            SessionState::PendingDuel { room_id, .. }
            | SessionState::InRoom { room_id, .. }
            | SessionState::Observing { room_id } => Some(*room_id),
            _ => None,
        }
    }

    pub fn is_lobby(&self) -> bool {
        matches!(self, SessionState::Lobby)
    }

    /// Free to be challenged or listed as available
    pub fn is_available(&self) -> bool {
        matches!(self, SessionState::Lobby)
    }

    /// Short label for listings and metrics
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Lobby => "lobby",
            SessionState::AwaitingOpponentName => "choosing_opponent",
            SessionState::PendingDuel { .. } => "pending_duel",
            SessionState::InRoom { .. } => "in_room",
            SessionState::Observing { .. } => "observing",
            SessionState::Prompt(_) => "prompt",
            SessionState::Replaying => "replaying",
        }
    }
}
