//! Main application state and service coordination
//!
//! Builds the stores, binds the game listener and wires the dispatcher,
//! the accept loop, the health server and the maintenance tasks together.

use crate::config::AppConfig;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::profile::{FlatFileProfileStore, ProfileStore};
use crate::replay::{DirectoryArchive, GameArchive};
use crate::server::{accept_loop, ArenaEvent, Dispatcher, EVENT_QUEUE_CAPACITY};
use crate::service::health::{ArenaStats, HealthCheck, SharedStats};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to bind {address}: {message}")]
    Bind { address: String, message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    config: AppConfig,
    profiles: Arc<dyn ProfileStore>,
    archive: Arc<dyn GameArchive>,
    metrics_service: Arc<MetricsService>,
    stats: SharedStats,

    /// Game listener, handed to the accept loop on start
    listener: Option<TcpListener>,
    local_addr: SocketAddr,

    events: mpsc::Sender<ArenaEvent>,
    event_rx: Option<mpsc::Receiver<ArenaEvent>>,
    dispatcher_task: Option<JoinHandle<()>>,
    listener_shutdown: broadcast::Sender<()>,
    stop_requested: watch::Sender<bool>,

    background_tasks: Vec<JoinHandle<()>>,
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Open the flat-file stores and bind the game port
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!(
            "Initializing {} (data: {}, games: {})",
            config.service.name,
            config.storage.data_dir.display(),
            config.storage.games_dir.display()
        );

        let profiles = FlatFileProfileStore::open(
            &config.storage.data_dir,
            config.arena.initial_elo,
        )
        .map_err(|e| ServiceError::Initialization {
            message: format!("Failed to open profile store: {}", e),
        })?;
        let archive = DirectoryArchive::new(&config.storage.games_dir).map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to open game archive: {}", e),
            }
        })?;

        Self::with_stores(config, Arc::new(profiles), Arc::new(archive)).await
    }

    /// Build the service on the given stores
    pub async fn with_stores(
        config: AppConfig,
        profiles: Arc<dyn ProfileStore>,
        archive: Arc<dyn GameArchive>,
    ) -> Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let stats = Arc::new(RwLock::new(ArenaStats::idle(
            config.arena.max_clients,
            config.arena.max_rooms,
        )));
        let metrics_service = Self::initialize_metrics(&config, stats.clone())?;

        let address = config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::Bind {
                address: address.clone(),
                message: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| ServiceError::Bind {
            address,
            message: e.to_string(),
        })?;

        let (events, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (listener_shutdown, _) = broadcast::channel(1);
        let (stop_requested, _) = watch::channel(false);

        Ok(Self {
            config,
            profiles,
            archive,
            metrics_service,
            stats,
            listener: Some(listener),
            local_addr,
            events,
            event_rx: Some(event_rx),
            dispatcher_task: None,
            listener_shutdown,
            stop_requested,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start the dispatcher, the accept loop and the background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        let (Some(listener), Some(event_rx)) = (self.listener.take(), self.event_rx.take()) else {
            return Err(ServiceError::Initialization {
                message: "service already started".to_string(),
            });
        };

        *self.is_running.write().await = true;

        let dispatcher = Dispatcher::new(
            self.config.arena.clone(),
            self.profiles.clone(),
            self.archive.clone(),
        )
        .with_metrics(self.metrics_service.collector());
        let stats = self.stats.clone();
        self.dispatcher_task = Some(tokio::spawn(async move {
            dispatcher.run(event_rx, Some(stats)).await;
        }));

        let events = self.events.clone();
        let max_line_length = self.config.network.max_line_length;
        let shutdown = self.listener_shutdown.subscribe();
        self.background_tasks.push(tokio::spawn(async move {
            accept_loop(listener, events, max_line_length, shutdown).await;
        }));

        if self.config.health_enabled() {
            self.start_metrics_service().await;
        } else {
            info!("Health endpoint disabled");
        }
        if self.config.service.stdin_shutdown {
            self.start_stdin_watch();
        }
        self.start_health_metrics_task();

        info!("✅ Arena listening on {}", self.local_addr);
        Ok(())
    }

    /// Tell every client, stop accepting, and wait for the dispatcher
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);
        *self.is_running.write().await = false;

        if self.events.send(ArenaEvent::Shutdown).await.is_err() {
            debug!("Dispatcher already stopped");
        }
        let _ = self.listener_shutdown.send(());
        self.metrics_service.stop();

        if let Some(task) = self.dispatcher_task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout(), task).await {
                Ok(Ok(())) => info!("✅ Dispatcher stopped"),
                Ok(Err(e)) => {
                    return Err(ServiceError::BackgroundTask {
                        message: format!("Dispatcher task failed: {}", e),
                    })
                }
                Err(_) => warn!("⚠️  Dispatcher did not stop within the shutdown timeout"),
            }
        }

        self.stop_background_tasks().await;

        let final_stats = self.stats.read().await.clone();
        info!(
            "Final statistics: {} games started, {} finished, {} moves",
            final_stats.games_started, final_stats.games_finished, final_stats.moves_played
        );
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Address the game listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn stats(&self) -> SharedStats {
        self.stats.clone()
    }

    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    /// Ask the owner of this state to shut it down
    ///
    /// The request is kept even if nobody is waiting on `stop_requested` yet.
    pub fn request_stop(&self) {
        self.stop_requested.send_replace(true);
    }

    /// Resolves once a shutdown was requested from inside the service
    pub async fn stop_requested(&self) {
        let mut requested = self.stop_requested.subscribe();
        if requested.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    fn initialize_metrics(
        config: &AppConfig,
        stats: SharedStats,
    ) -> Result<Arc<MetricsService>, ServiceError> {
        let collector = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let health_config = HealthServerConfig {
            port: config.service.health_port,
            host: config.network.host.clone(),
        };
        let health_server =
            Arc::new(HealthServer::new(health_config, collector.clone()).with_stats(stats));
        Ok(Arc::new(MetricsService::new(collector, health_server)))
    }

    async fn start_metrics_service(&mut self) {
        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.health_port;
        self.background_tasks.push(tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            }
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        info!("✅ Health endpoint started on port {}", port);
    }

    /// A line or EOF on stdin requests a shutdown
    fn start_stdin_watch(&mut self) {
        let stop_requested = self.stop_requested.clone();
        self.background_tasks.push(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            match lines.next_line().await {
                Ok(Some(_)) => info!("Shutdown requested on stdin"),
                Ok(None) => info!("Stdin closed, shutting down"),
                Err(e) => warn!("Failed to read stdin ({}), shutting down", e),
            }
            stop_requested.send_replace(true);
        }));
    }

    fn start_health_metrics_task(&mut self) {
        let collector = self.metrics_service.collector();
        let stats = self.stats.clone();
        let is_running = self.is_running.clone();

        self.background_tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            while *is_running.read().await {
                interval.tick().await;

                let snapshot = stats.read().await.clone();
                let status = HealthCheck::evaluate(&snapshot);
                collector.update_uptime(Duration::from_secs(snapshot.uptime_seconds() as u64));
                collector.update_health_status(status.as_gauge());
                debug!(
                    "Health {}: {} sessions, {} active rooms",
                    status, snapshot.sessions, snapshot.active_rooms
                );
            }
        }));
    }

    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        if task_count > 0 {
            info!("✅ {} background tasks stopped", task_count);
        }
    }
}
