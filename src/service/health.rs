//! Health evaluation for the arena
//!
//! The dispatcher publishes an [`ArenaStats`] snapshot after every event; the
//! health endpoints read the latest one and derive a status from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Numeric form used by the health gauge
    pub fn as_gauge(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Snapshot of the arena's tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArenaStats {
    /// Dispatcher is accepting events
    pub running: bool,
    pub started_at: DateTime<Utc>,
    pub sessions: usize,
    pub max_clients: usize,
    pub active_rooms: usize,
    pub pending_duels: usize,
    pub max_rooms: usize,
    pub observers: usize,
    /// Games started since the service started
    pub games_started: u64,
    /// Games finished since the service started
    pub games_finished: u64,
    /// Moves accepted since the service started
    pub moves_played: u64,
}

impl ArenaStats {
    /// Stats of a service that has not started its dispatcher yet
    pub fn idle(max_clients: usize, max_rooms: usize) -> Self {
        Self {
            running: false,
            started_at: Utc::now(),
            sessions: 0,
            max_clients,
            active_rooms: 0,
            pending_duels: 0,
            max_rooms,
            observers: 0,
            games_started: 0,
            games_finished: 0,
            moves_played: 0,
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

/// Stats shared between the dispatcher and the health server
pub type SharedStats = Arc<RwLock<ArenaStats>>;

/// Health derivation rules
pub struct HealthCheck;

impl HealthCheck {
    /// Overall status for a stats snapshot
    ///
    /// Unhealthy when the dispatcher is not running, degraded when the client
    /// table or every room slot is taken.
    pub fn evaluate(stats: &ArenaStats) -> HealthStatus {
        if !stats.running {
            HealthStatus::Unhealthy
        } else if stats.sessions >= stats.max_clients
            || stats.active_rooms + stats.pending_duels >= stats.max_rooms
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    /// Liveness: only whether the dispatcher runs
    pub async fn liveness_check(stats: &SharedStats) -> HealthStatus {
        if stats.read().await.running {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Readiness: full evaluation of the latest snapshot
    pub async fn readiness_check(stats: &SharedStats) -> HealthStatus {
        Self::evaluate(&*stats.read().await)
    }
}
