//! Prometheus metrics for observability.
//!
//! Server-side metrics:
//! - HTTP request metrics (latency, counts)
//! - Ingest forwarding (batches, records)
//! - Scanner and audio state (collected dynamically)
//!
//! Core metrics from `sigint_core::metrics` share the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use tracing::error;

use sigint_core::Medium;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "sigint_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sigint_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sigint_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Ingest Metrics
// =============================================================================

/// Push attempts by outcome.
pub static INGEST_BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sigint_ingest_batches_total", "Ingest push attempts"),
        &["outcome"], // "ok", "rejected", "error"
    )
    .unwrap()
});

/// Records accepted upstream.
pub static INGEST_RECORDS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sigint_ingest_records_total",
        "Total discovery records pushed upstream",
    )
    .unwrap()
});

/// Records dropped because the queue was full or closed.
pub static INGEST_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sigint_ingest_dropped_total",
        "Discovery records dropped before forwarding",
    )
    .unwrap()
});

// =============================================================================
// Scanner Metrics (collected dynamically)
// =============================================================================

/// Scanner running state (1 = running, 0 = stopped).
pub static SCANNER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sigint_scanner_running",
        "Whether the scan loop is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Audio session state (1 = active).
pub static AUDIO_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("sigint_audio_active", "Whether an audio session is live").unwrap()
});

/// Medium availability from the last capability check.
pub static MEDIUM_AVAILABLE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("sigint_medium_available", "Whether a medium can be probed"),
        &["medium"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // Ingest
        Box::new(INGEST_BATCHES_TOTAL.clone()),
        Box::new(INGEST_RECORDS_TOTAL.clone()),
        Box::new(INGEST_DROPPED_TOTAL.clone()),
        // Scanner
        Box::new(SCANNER_RUNNING.clone()),
        Box::new(AUDIO_ACTIVE.clone()),
        Box::new(MEDIUM_AVAILABLE.clone()),
    ];

    // Core metrics (scan loop, probes, audio sessions)
    for metric in server.into_iter().chain(sigint_core::metrics::all_metrics()) {
        if let Err(e) = registry.register(metric) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the shared status record.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    SCANNER_RUNNING.set(status.running as i64);
    AUDIO_ACTIVE.set(status.audio.active as i64);

    let available = status.available;
    for (medium, flag) in [
        (Medium::Ble, available.ble),
        (Medium::Wifi, available.wifi),
        (Medium::Sdr, available.sdr),
        (Medium::Gps, available.gps),
    ] {
        MEDIUM_AVAILABLE
            .with_label_values(&[medium.as_str()])
            .set(flag as i64);
    }
    MEDIUM_AVAILABLE
        .with_label_values(&["audio"])
        .set(available.audio as i64);
}
