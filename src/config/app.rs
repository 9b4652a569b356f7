//! Main application configuration
//!
//! Defaults, overridden by a TOML file or by environment variables, then
//! by command line flags in `main`. Everything is validated before the
//! server binds a socket.

use super::arena::ArenaSettings;
use crate::rating::EloPolicy;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub network: NetworkSettings,
    pub arena: ArenaSettings,
    pub storage: StorageSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port of the health and metrics endpoint, 0 to disable it
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Shut down on a line or EOF on stdin
    pub stdin_shutdown: bool,
}

/// Game listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub host: String,
    pub port: u16,
    /// Inbound lines longer than this are truncated
    pub max_line_length: usize,
}

/// Where profiles and game logs live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory of the profile tables
    pub data_dir: PathBuf,
    /// Directory of recorded games
    pub games_dir: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "awale-arena".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
            stdin_shutdown: true,
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1977,
            max_line_length: 1024,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            games_dir: PathBuf::from("games"),
        }
    }
}

/// Overwrite `target` with the parsed value of `key`, if set
fn env_override<T: FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(raw) = env::var(key) {
        *target = raw
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw))?;
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        env_override("SERVICE_NAME", &mut config.service.name)?;
        env_override("LOG_LEVEL", &mut config.service.log_level)?;
        env_override("HEALTH_PORT", &mut config.service.health_port)?;
        env_override(
            "SHUTDOWN_TIMEOUT_SECONDS",
            &mut config.service.shutdown_timeout_seconds,
        )?;
        env_override("STDIN_SHUTDOWN", &mut config.service.stdin_shutdown)?;

        env_override("ARENA_HOST", &mut config.network.host)?;
        env_override("ARENA_PORT", &mut config.network.port)?;
        env_override("MAX_LINE_LENGTH", &mut config.network.max_line_length)?;

        env_override("MAX_CLIENTS", &mut config.arena.max_clients)?;
        env_override("MAX_ROOMS", &mut config.arena.max_rooms)?;
        env_override("INITIAL_ELO", &mut config.arena.initial_elo)?;
        if let Ok(raw) = env::var("ELO_K_FACTOR") {
            let k_factor = raw
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", raw))?;
            config.arena.rating = EloPolicy::Dynamic { k_factor };
        } else if let Ok(raw) = env::var("ELO_DELTA") {
            let delta = raw
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_DELTA value: {}", raw))?;
            config.arena.rating = EloPolicy::Fixed { delta };
        }

        env_override("DATA_DIR", &mut config.storage.data_dir)?;
        env_override("GAMES_DIR", &mut config.storage.games_dir)?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// `host:port` of the game listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.network.host, self.network.port)
    }

    pub fn health_enabled(&self) -> bool {
        self.service.health_port != 0
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.network.host.is_empty() {
        return Err(anyhow!("Listen host cannot be empty"));
    }
    if config.network.max_line_length == 0 {
        return Err(anyhow!("Max line length must be greater than 0"));
    }
    if config.service.health_port != 0 && config.service.health_port == config.network.port {
        return Err(anyhow!(
            "Health port and game port must differ, both are {}",
            config.network.port
        ));
    }

    if config.arena.max_clients < 2 {
        return Err(anyhow!(
            "Max clients must allow at least 2 players, got {}",
            config.arena.max_clients
        ));
    }
    if config.arena.max_rooms == 0 {
        return Err(anyhow!("Max rooms must be greater than 0"));
    }
    if config.arena.initial_elo < 0 {
        return Err(anyhow!(
            "Initial ELO must not be negative, got {}",
            config.arena.initial_elo
        ));
    }
    config.arena.rating.validate()?;

    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }
    if config.storage.games_dir.as_os_str().is_empty() {
        return Err(anyhow!("Games directory cannot be empty"));
    }

    Ok(())
}
