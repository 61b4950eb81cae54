//! Scan loop and host tool handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use sigint_core::{CapabilityReport, Discovery, ScannerStatus};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Returned by start and stop.
#[derive(Debug, Serialize)]
pub struct ScannerControlResponse {
    pub message: String,
    pub status: ScannerStatus,
}

/// Result of a manual scan.
#[derive(Debug, Serialize)]
pub struct ManualScanResponse {
    pub count: usize,
    pub discoveries: Vec<Discovery>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/scanner/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ScannerStatus> {
    Json(state.orchestrator().status().await)
}

/// POST /api/v1/scanner/start
///
/// Probes host tools on the first start, then begins the scan loop.
/// Starting a running scanner is a no-op.
pub async fn start(State(state): State<Arc<AppState>>) -> Json<ScannerControlResponse> {
    let orchestrator = state.orchestrator();
    let message = if orchestrator.is_running() {
        "Scanner already running"
    } else {
        orchestrator.start().await;
        "Scanner started"
    };

    Json(ScannerControlResponse {
        message: message.to_string(),
        status: orchestrator.status().await,
    })
}

/// POST /api/v1/scanner/stop
///
/// Stops the scan loop and any audio session.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<ScannerControlResponse> {
    let orchestrator = state.orchestrator();
    orchestrator.stop().await;

    Json(ScannerControlResponse {
        message: "Scanner stopped".to_string(),
        status: orchestrator.status().await,
    })
}

/// POST /api/v1/scanner/scan
///
/// Runs one cycle and returns what it found. Results are not forwarded.
pub async fn manual_scan(State(state): State<Arc<AppState>>) -> Json<ManualScanResponse> {
    let discoveries = state.orchestrator().run_manual_scan().await;
    Json(ManualScanResponse {
        count: discoveries.len(),
        discoveries,
    })
}

/// GET /api/v1/dependencies
pub async fn get_dependencies(State(state): State<Arc<AppState>>) -> Json<CapabilityReport> {
    Json(state.orchestrator().dependency_status().await)
}

/// POST /api/v1/dependencies/check
pub async fn check_dependencies(State(state): State<Arc<AppState>>) -> Json<CapabilityReport> {
    Json(state.orchestrator().check_capabilities().await)
}
