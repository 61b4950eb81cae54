//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scan loop (cycles, discoveries per medium)
//! - Per-medium probes (failures, duration)
//! - Audio sessions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Scan Loop Metrics
// =============================================================================

/// Completed scan cycles.
pub static SCAN_CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("sigint_scan_cycles_total", "Total completed scan cycles").unwrap()
});

/// Discoveries handed to the callback, by medium.
pub static DISCOVERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sigint_discoveries_total", "Total discoveries emitted"),
        &["medium"], // "ble", "wifi", "sdr"
    )
    .unwrap()
});

// =============================================================================
// Probe Metrics
// =============================================================================

/// Failed probes, by medium.
pub static PROBE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sigint_probe_failures_total", "Total failed medium probes"),
        &["medium"],
    )
    .unwrap()
});

/// Probe duration in seconds, by medium.
pub static PROBE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "sigint_probe_duration_seconds",
            "Duration of a single medium probe",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["medium"],
    )
    .unwrap()
});

// =============================================================================
// Audio Metrics
// =============================================================================

/// Audio session outcomes.
pub static AUDIO_SESSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sigint_audio_sessions_total", "Total audio session events"),
        &["outcome"], // "started", "stopped", "exited", "missing_tools", "spawn_failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SCAN_CYCLES.clone()),
        Box::new(DISCOVERIES.clone()),
        Box::new(PROBE_FAILURES.clone()),
        Box::new(PROBE_DURATION.clone()),
        Box::new(AUDIO_SESSIONS.clone()),
    ]
}
