// Telemetry: tracing setup and request metrics
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 1024;

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Calling this more than once is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Request statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub avg_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_rate: f64,
}

/// Collects latency and failure counts for API requests
#[derive(Clone, Default)]
pub struct RequestMetrics {
    stats: Arc<RwLock<RequestStats>>,
    latencies: Arc<RwLock<VecDeque<Duration>>>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished request
    pub async fn record(&self, latency: Duration, success: bool) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        if !success {
            stats.failed_requests += 1;
        }
        stats.error_rate = stats.failed_requests as f64 / stats.total_requests as f64;

        let mut latencies = self.latencies.write().await;
        if latencies.len() == LATENCY_WINDOW {
            latencies.pop_front();
        }
        latencies.push_back(latency);

        let total_ms: f64 = latencies.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
        stats.avg_latency_ms = total_ms / latencies.len() as f64;

        let mut sorted: Vec<Duration> = latencies.iter().copied().collect();
        sorted.sort();
        let p99_idx = ((sorted.len() as f64 * 0.99) as usize).min(sorted.len() - 1);
        stats.p99_latency_ms = sorted[p99_idx].as_secs_f64() * 1000.0;
    }

    pub async fn snapshot(&self) -> RequestStats {
        self.stats.read().await.clone()
    }
}
