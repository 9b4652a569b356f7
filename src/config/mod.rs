//! Configuration management for the arena
//!
//! Loading from defaults, TOML files and environment variables, and
//! validation before startup.

pub mod app;
pub mod arena;

pub use app::{validate_config, AppConfig, NetworkSettings, ServiceSettings, StorageSettings};
pub use arena::ArenaSettings;
