//! Arena limits and rating configuration

use crate::profile::DEFAULT_ELO;
use crate::rating::EloPolicy;
use serde::{Deserialize, Serialize};

/// Limits and rating rules for the game engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Maximum connected clients (also bounds each observer set)
    pub max_clients: usize,
    /// Number of room slots
    pub max_rooms: usize,
    /// Rating given to players the profile store has never seen
    pub initial_elo: i32,
    /// How ratings change after a decided game
    pub rating: EloPolicy,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            max_clients: 100,
            max_rooms: 100,
            initial_elo: DEFAULT_ELO,
            rating: EloPolicy::default(),
        }
    }
}
