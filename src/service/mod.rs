//! Service layer for the arena
//!
//! Application state, startup and shutdown, and health evaluation.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{ArenaStats, HealthCheck, HealthStatus, SharedStats};
