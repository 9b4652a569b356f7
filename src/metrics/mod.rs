//! Metrics and monitoring for the arena
//!
//! Prometheus counters and gauges fed by the dispatcher, plus the HTTP
//! server that exposes them with the health endpoints.

pub mod collector;
pub mod health;

pub use collector::{
    ConnectionMetrics, GameMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics,
    ServiceMetrics,
};
pub use health::{HealthServer, HealthServerConfig};

use std::sync::Arc;

/// Collector and health server, started and stopped together
#[derive(Clone)]
pub struct MetricsService {
    collector: Arc<MetricsCollector>,
    health_server: Arc<HealthServer>,
}

impl MetricsService {
    pub fn new(collector: Arc<MetricsCollector>, health_server: Arc<HealthServer>) -> Self {
        Self {
            collector,
            health_server,
        }
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn health_server(&self) -> Arc<HealthServer> {
        self.health_server.clone()
    }

    /// Serve the health endpoints until stopped
    pub async fn start(&self) -> anyhow::Result<()> {
        self.health_server.start().await
    }

    pub fn stop(&self) {
        self.health_server.stop()
    }
}
