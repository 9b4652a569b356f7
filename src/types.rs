//! Common types used throughout the arena

use serde::{Deserialize, Serialize};

/// Index of a slot in the room registry
pub type RoomId = usize;

/// Display name chosen by a client at handshake
pub type PlayerName = String;

/// Stable identifier for a connected client
///
/// Assigned by the I/O layer when a socket is accepted and never reused
/// during a server run, so holding one across a removal is always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which side of the board a player owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    /// Player 0, owns pits 0-5 and moves first
    First,
    /// Player 1, owns pits 6-11
    Second,
}

impl Seat {
    /// Both seats in turn order
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    /// Array index of this seat (0 or 1)
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    /// The other seat
    pub fn opponent(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seat::First => write!(f, "P1"),
            Seat::Second => write!(f, "P2"),
        }
    }
}

/// Who may watch a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPrivacy {
    #[default]
    Public,
    FriendsOnly,
}

impl RoomPrivacy {
    /// Flip between public and friends-only
    pub fn toggled(self) -> Self {
        match self {
            RoomPrivacy::Public => RoomPrivacy::FriendsOnly,
            RoomPrivacy::FriendsOnly => RoomPrivacy::Public,
        }
    }
}

impl std::fmt::Display for RoomPrivacy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomPrivacy::Public => write!(f, "public"),
            RoomPrivacy::FriendsOnly => write!(f, "friends-only"),
        }
    }
}

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// A player captured more than half of the seeds, or won on the final count
    Victory { winner: Seat },
    /// A player left with `/-1` or disconnected
    Forfeit { loser: Seat },
    /// Final count was level
    Draw,
}

impl GameOutcome {
    /// The seat that won, if any
    pub fn winner(&self) -> Option<Seat> {
        match self {
            GameOutcome::Victory { winner } => Some(*winner),
            GameOutcome::Forfeit { loser } => Some(loser.opponent()),
            GameOutcome::Draw => None,
        }
    }

    /// Label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            GameOutcome::Victory { .. } => "victory",
            GameOutcome::Forfeit { .. } => "forfeit",
            GameOutcome::Draw => "draw",
        }
    }
}
