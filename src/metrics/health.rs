//! Health check endpoints and Prometheus metrics server
//!
//! A small Axum server next to the game port: liveness, readiness, the
//! Prometheus scrape endpoint and a JSON view of the arena's tables.

use crate::metrics::collector::MetricsCollector;
use crate::service::health::{HealthCheck, HealthStatus, SharedStats};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "awale-arena";

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HealthServerConfig {
    /// Port to bind the health server to
    pub port: u16,
    /// Host to bind to
    pub host: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the health server
#[derive(Clone)]
pub struct HealthServerState {
    pub metrics_collector: Arc<MetricsCollector>,
    pub stats: Option<SharedStats>,
}

/// Health server that provides HTTP endpoints for monitoring
pub struct HealthServer {
    config: HealthServerConfig,
    state: HealthServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HealthServer {
    pub fn new(config: HealthServerConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HealthServerState {
                metrics_collector,
                stats: None,
            },
            shutdown_tx,
        }
    }

    /// Report on the stats the dispatcher publishes
    pub fn with_stats(mut self, stats: SharedStats) -> Self {
        self.state.stats = Some(stats);
        self
    }

    /// Serve until [`HealthServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid health server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind health server to {addr}"))?;

        info!("Health server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Health server shutdown signal received");
            })
            .await?;

        info!("Health server stopped");
        Ok(())
    }

    fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(self.state.clone())
    }

    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to health server: {}", e);
        }
    }
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/ready", "/alive", "/metrics", "/stats"]
    }))
}

fn status_body(status: &str) -> Json<serde_json::Value> {
    Json(json!({
        "status": status,
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    let Some(stats) = &state.stats else {
        return (StatusCode::SERVICE_UNAVAILABLE, status_body("unhealthy"));
    };
    let status = HealthCheck::readiness_check(stats).await;
    state
        .metrics_collector
        .update_health_status(status.as_gauge());
    match status {
        HealthStatus::Healthy => (StatusCode::OK, status_body("healthy")),
        HealthStatus::Degraded => (StatusCode::OK, status_body("degraded")),
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, status_body("unhealthy")),
    }
}

async fn ready_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    match &state.stats {
        Some(stats) => match HealthCheck::readiness_check(stats).await {
            HealthStatus::Healthy => (StatusCode::OK, "Ready"),
            HealthStatus::Degraded => (StatusCode::OK, "Degraded but ready"),
            HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

async fn alive_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    match &state.stats {
        Some(stats) => match HealthCheck::liveness_check(stats).await {
            HealthStatus::Healthy => (StatusCode::OK, "Alive"),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

async fn metrics_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    if let Some(stats) = &state.stats {
        let uptime = stats.read().await.uptime_seconds();
        state
            .metrics_collector
            .update_uptime(std::time::Duration::from_secs(uptime as u64));
    }

    let metric_families = state.metrics_collector.registry().gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&metric_families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            body,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain".to_string())],
                "Failed to encode metrics".to_string(),
            )
        }
    }
}

/// Table sizes and counters, for humans
async fn stats_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    let Some(stats) = &state.stats else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "service": { "name": SERVICE_NAME, "status": "error" },
                "error": "Service not initialized",
                "timestamp": chrono::Utc::now()
            })),
        );
    };

    let snapshot = stats.read().await.clone();
    let status = HealthCheck::evaluate(&snapshot);
    (
        StatusCode::OK,
        Json(json!({
            "service": {
                "name": SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "status": status,
                "uptime_seconds": snapshot.uptime_seconds()
            },
            "sessions": {
                "connected": snapshot.sessions,
                "max": snapshot.max_clients
            },
            "rooms": {
                "active": snapshot.active_rooms,
                "pending_duels": snapshot.pending_duels,
                "max": snapshot.max_rooms,
                "observers": snapshot.observers
            },
            "games": {
                "started": snapshot.games_started,
                "finished": snapshot.games_finished,
                "moves": snapshot.moves_played
            },
            "timestamp": chrono::Utc::now()
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::health::ArenaStats;
    use axum::{body::Body, http::Request};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn server_with_stats(running: bool) -> HealthServer {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        let mut stats = ArenaStats::idle(10, 10);
        stats.running = running;
        HealthServer::new(HealthServerConfig::default(), collector)
            .with_stats(Arc::new(RwLock::new(stats)))
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        let app = HealthServer::new(HealthServerConfig::default(), collector).create_router();
        assert_eq!(get_status(app, "/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_endpoints_without_stats() {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        let app = HealthServer::new(HealthServerConfig::default(), collector).create_router();

        for uri in ["/health", "/ready", "/alive", "/stats"] {
            assert_eq!(
                get_status(app.clone(), uri).await,
                StatusCode::SERVICE_UNAVAILABLE,
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_endpoints_follow_dispatcher_state() {
        let app = server_with_stats(true).create_router();
        for uri in ["/health", "/ready", "/alive", "/stats"] {
            assert_eq!(get_status(app.clone(), uri).await, StatusCode::OK, "{uri}");
        }

        let app = server_with_stats(false).create_router();
        assert_eq!(
            get_status(app.clone(), "/alive").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(get_status(app, "/health").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        collector.record_game_started();
        let app = HealthServer::new(HealthServerConfig::default(), collector).create_router();

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("awale_arena_games_started_total 1"));
    }

    #[tokio::test]
    async fn test_404_handling() {
        let app = server_with_stats(true).create_router();
        assert_eq!(get_status(app, "/nonexistent").await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_health_server_config() {
        let config = HealthServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }
}
