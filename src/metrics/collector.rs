//! Metrics collection using Prometheus
//!
//! Counters and gauges for the arena, grouped the way they are read on a
//! dashboard: connections, games, and handler performance.

use crate::types::GameOutcome;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the arena
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    service_metrics: ServiceMetrics,
    connection_metrics: ConnectionMetrics,
    game_metrics: GameMetrics,
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

/// Client connection metrics
#[derive(Clone)]
pub struct ConnectionMetrics {
    /// Connections by handshake result (accepted, rejected)
    pub connections_total: IntCounterVec,

    /// Sessions currently registered
    pub sessions_active: IntGauge,

    /// Errors reported back to clients, by kind
    pub client_errors_total: IntCounterVec,
}

/// Game and room metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Duel requests by result (sent, accepted, abandoned, refused)
    pub duel_requests_total: IntCounterVec,

    /// Games started
    pub games_started_total: IntCounter,

    /// Games finished, by outcome
    pub games_finished_total: IntCounterVec,

    /// Moves by result (accepted, rejected)
    pub moves_total: IntCounterVec,

    /// Rooms currently active
    pub rooms_active: IntGauge,

    /// Observers across all rooms
    pub observers_active: IntGauge,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent handling one inbound line, cascades included
    pub line_handling_duration: Histogram,

    /// Game length in moves
    pub game_length_moves: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector on a given registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let connection_metrics = ConnectionMetrics::new(&registry)?;
        let game_metrics = GameMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            connection_metrics,
            game_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn connections(&self) -> &ConnectionMetrics {
        &self.connection_metrics
    }

    pub fn games(&self) -> &GameMetrics {
        &self.game_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record the outcome of a handshake
    pub fn record_connection(&self, accepted: bool) {
        let result = if accepted { "accepted" } else { "rejected" };
        self.connection_metrics
            .connections_total
            .with_label_values(&[result])
            .inc();
    }

    /// Record an error reported to a client
    pub fn record_client_error(&self, kind: &str) {
        self.connection_metrics
            .client_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_duel_request(&self, result: &str) {
        self.game_metrics
            .duel_requests_total
            .with_label_values(&[result])
            .inc();
    }

    pub fn record_game_started(&self) {
        self.game_metrics.games_started_total.inc();
    }

    pub fn record_game_finished(&self, outcome: &GameOutcome, moves: u32) {
        self.game_metrics
            .games_finished_total
            .with_label_values(&[outcome.label()])
            .inc();
        self.performance_metrics
            .game_length_moves
            .observe(moves as f64);
    }

    pub fn record_move(&self, accepted: bool) {
        let result = if accepted { "accepted" } else { "rejected" };
        self.game_metrics
            .moves_total
            .with_label_values(&[result])
            .inc();
    }

    /// Refresh the gauges from the current table sizes
    pub fn update_gauges(&self, sessions: usize, rooms: usize, observers: usize) {
        self.connection_metrics.sessions_active.set(sessions as i64);
        self.game_metrics.rooms_active.set(rooms as i64);
        self.game_metrics.observers_active.set(observers as i64);
    }

    pub fn record_line_handled(&self, duration: Duration) {
        self.performance_metrics
            .line_handling_duration
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("awale_arena_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "awale_arena_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
        })
    }
}

impl ConnectionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let connections_total = IntCounterVec::new(
            Opts::new(
                "awale_arena_connections_total",
                "Client connections by handshake result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(connections_total.clone()))?;

        let sessions_active =
            IntGauge::new("awale_arena_sessions_active", "Sessions currently registered")?;
        registry.register(Box::new(sessions_active.clone()))?;

        let client_errors_total = IntCounterVec::new(
            Opts::new(
                "awale_arena_client_errors_total",
                "Errors reported to clients by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(client_errors_total.clone()))?;

        Ok(Self {
            connections_total,
            sessions_active,
            client_errors_total,
        })
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let duel_requests_total = IntCounterVec::new(
            Opts::new("awale_arena_duel_requests_total", "Duel requests by result"),
            &["result"],
        )?;
        registry.register(Box::new(duel_requests_total.clone()))?;

        let games_started_total =
            IntCounter::new("awale_arena_games_started_total", "Total games started")?;
        registry.register(Box::new(games_started_total.clone()))?;

        let games_finished_total = IntCounterVec::new(
            Opts::new("awale_arena_games_finished_total", "Games finished by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(games_finished_total.clone()))?;

        let moves_total = IntCounterVec::new(
            Opts::new("awale_arena_moves_total", "Moves by result"),
            &["result"],
        )?;
        registry.register(Box::new(moves_total.clone()))?;

        let rooms_active = IntGauge::new("awale_arena_rooms_active", "Rooms currently active")?;
        registry.register(Box::new(rooms_active.clone()))?;

        let observers_active =
            IntGauge::new("awale_arena_observers_active", "Observers across all rooms")?;
        registry.register(Box::new(observers_active.clone()))?;

        Ok(Self {
            duel_requests_total,
            games_started_total,
            games_finished_total,
            moves_total,
            rooms_active,
            observers_active,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let line_handling_duration = Histogram::with_opts(
            HistogramOpts::new(
                "awale_arena_line_handling_duration_seconds",
                "Time spent handling one inbound line",
            )
            .buckets(vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(line_handling_duration.clone()))?;

        let game_length_moves = Histogram::with_opts(
            HistogramOpts::new("awale_arena_game_length_moves", "Game length in moves")
                .buckets(vec![5.0, 10.0, 20.0, 40.0, 60.0, 80.0, 120.0, 200.0]),
        )?;
        registry.register(Box::new(game_length_moves.clone()))?;

        Ok(Self {
            line_handling_duration,
            game_length_moves,
        })
    }
}
