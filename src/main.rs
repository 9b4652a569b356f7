//! Main entry point for the Awalé Arena server
//!
//! Loads and validates the configuration, starts the service and waits for
//! SIGINT, SIGTERM or a line on stdin before shutting down gracefully.

use anyhow::Result;
use awale_arena::config::{validate_config, AppConfig};
use awale_arena::rating::EloPolicy;
use awale_arena::service::AppState;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Awalé Arena - multiplayer Awalé over a plain-text TCP protocol
#[derive(Parser)]
#[command(
    name = "awale-arena",
    version,
    about = "A line-protocol Awalé server with duels, spectators, replays and ELO ratings",
    long_about = "Awalé Arena accepts players over TCP, matches them in duels from a lobby, \
                 enforces the Awalé capture and famine rules, lets others watch live games, \
                 records every game for replay and keeps an ELO ladder."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Game port override
    #[arg(short, long, value_name = "PORT", help = "Override the game port")]
    port: Option<u16>,

    /// Listen host override
    #[arg(long, value_name = "HOST", help = "Override the listen address")]
    host: Option<String>,

    /// Health port override
    #[arg(
        long,
        value_name = "PORT",
        help = "Override health/metrics port (0 disables it)"
    )]
    health_port: Option<u16>,

    #[arg(long, value_name = "N", help = "Override the maximum number of clients")]
    max_clients: Option<usize>,

    #[arg(long, value_name = "N", help = "Override the number of room slots")]
    max_rooms: Option<usize>,

    #[arg(long, value_name = "DIR", help = "Directory of the profile tables")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Directory of recorded games")]
    games_dir: Option<PathBuf>,

    /// Fixed ELO exchange override
    #[arg(long, value_name = "POINTS", help = "Use a fixed ELO exchange of POINTS")]
    elo_delta: Option<i32>,

    #[arg(long, help = "Ignore stdin instead of shutting down on input")]
    no_stdin_shutdown: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🎲 Awalé Arena");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Game port: {}", config.listen_address());
    if config.health_enabled() {
        info!("   Health port: {}", config.service.health_port);
    } else {
        info!("   Health port: disabled");
    }
    info!(
        "   Limits: {} clients, {} rooms",
        config.arena.max_clients, config.arena.max_rooms
    );
    match config.arena.rating {
        EloPolicy::Fixed { delta } => info!("   Rating: fixed ±{}", delta),
        EloPolicy::Dynamic { k_factor } => info!("   Rating: elo, K = {}", k_factor),
    }
    info!(
        "   Storage: {} (profiles), {} (games)",
        config.storage.data_dir.display(),
        config.storage.games_dir.display()
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(port) = args.port {
        config.network.port = port;
    }
    if let Some(host) = &args.host {
        config.network.host = host.clone();
    }
    if let Some(health_port) = args.health_port {
        config.service.health_port = health_port;
    }
    if let Some(max_clients) = args.max_clients {
        config.arena.max_clients = max_clients;
    }
    if let Some(max_rooms) = args.max_rooms {
        config.arena.max_rooms = max_rooms;
    }
    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(games_dir) = &args.games_dir {
        config.storage.games_dir = games_dir.clone();
    }
    if let Some(delta) = args.elo_delta {
        config.arena.rating = EloPolicy::Fixed { delta };
    }
    if args.no_stdin_shutdown {
        config.service.stdin_shutdown = false;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    info!("✅ Awalé Arena is running");
    if config.service.stdin_shutdown {
        info!("Press Ctrl+C or Enter to shutdown gracefully...");
    } else {
        info!("Press Ctrl+C to shutdown gracefully...");
    }

    tokio::select! {
        _ = wait_for_shutdown_signal() => {},
        _ = app_state.stop_requested() => {},
    }

    info!("🛑 Shutdown requested, beginning graceful shutdown...");
    match tokio::time::timeout(config.shutdown_timeout(), app_state.shutdown()).await {
        Ok(Ok(())) => info!("✅ Graceful shutdown completed successfully"),
        Ok(Err(e)) => error!("Shutdown failed: {}", e),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, forcing exit"),
    }

    info!("🛑 Awalé Arena stopped");
    Ok(())
}
