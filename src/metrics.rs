//! Prometheus metrics for solswap
//!
//! Exposes:
//! - Swap request counter by outcome
//! - Swap latency histogram
//! - Last resolved priority fee

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics state
pub struct MetricsState {
    /// Prometheus registry
    registry: Registry,
    /// Swap requests by outcome (success, simulated, failure reason)
    pub swaps_total: IntCounterVec,
    /// End-to-end swap latency (in milliseconds)
    pub swap_latency: Histogram,
    /// Last priority fee in micro-lamports per CU (0 = auto)
    pub priority_fee: IntGauge,
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let swaps_total = IntCounterVec::new(
            Opts::new("solswap_swaps_total", "Swap requests by outcome"),
            &["outcome"],
        )
        .expect("Failed to create swaps_total counter");
        registry
            .register(Box::new(swaps_total.clone()))
            .expect("Failed to register swaps_total");

        let swap_latency = Histogram::with_opts(
            HistogramOpts::new("solswap_swap_latency_ms", "Swap latency in milliseconds")
                .buckets(vec![
                    250.0, 500.0, 1_000.0, 2_000.0, 5_000.0, 10_000.0, 30_000.0, 60_000.0,
                ]),
        )
        .expect("Failed to create swap_latency histogram");
        registry
            .register(Box::new(swap_latency.clone()))
            .expect("Failed to register swap_latency");

        let priority_fee = IntGauge::with_opts(Opts::new(
            "solswap_priority_fee_micro_lamports",
            "Last resolved priority fee (0 = auto)",
        ))
        .expect("Failed to create priority_fee gauge");
        registry
            .register(Box::new(priority_fee.clone()))
            .expect("Failed to register priority_fee");

        Self {
            registry,
            swaps_total,
            swap_latency,
            priority_fee,
        }
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count a swap under `outcome` and record its latency
    pub fn observe_swap(&self, outcome: &str, latency_ms: f64) {
        self.swaps_total.with_label_values(&[outcome]).inc();
        self.swap_latency.observe(latency_ms);
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics handler - returns Prometheus metrics in text format
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry().gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("Content-Type", "text/plain; version=0.0.4")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Create metrics router
pub fn metrics_router() -> Router<Arc<MetricsState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
