//! In-process API tests over mocked host tools and audio pipeline.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;
use sigint_core::capabilities::APLAY;

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::bare().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_hides_ingest_key() {
    let fixture = TestFixture::bare().await;

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    assert_eq!(response.body["ingest"]["url"], "http://collector.invalid");
    assert_eq!(response.body["ingest"]["api_key_configured"], true);
    assert!(!response.text.contains("secret-ingest-key"));
}

// =============================================================================
// Scanner
// =============================================================================

#[tokio::test]
async fn test_status_before_start() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/scanner/status").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "running", json!(false));
    assert_json_path!(response.body, "cycles_completed", json!(0));
    assert_eq!(response.body["audio"]["active"], false);
}

#[tokio::test]
async fn test_start_and_stop_scanner() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/scanner/start").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "message", json!("Scanner started"));
    assert_eq!(response.body["status"]["running"], true);
    assert_eq!(response.body["status"]["available"]["ble"], true);
    assert!(response.body["status"]["node_id"].is_string());

    let response = fixture.post_empty("/api/v1/scanner/start").await;
    assert_json_path!(response.body, "message", json!("Scanner already running"));

    let response = fixture.post_empty("/api/v1/scanner/stop").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"]["running"], false);
    assert!(!fixture.orchestrator.is_running());
}

#[tokio::test]
async fn test_manual_scan_returns_discoveries() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/dependencies/check").await;

    let response = fixture.post_empty("/api/v1/scanner/scan").await;
    assert_status!(response, StatusCode::OK);

    let discoveries = response.body["discoveries"].as_array().unwrap();
    assert_eq!(response.body["count"], discoveries.len());
    assert!(discoveries.iter().any(|d| d["medium"] == "ble"));
    assert!(discoveries.iter().any(|d| d["medium"] == "wifi"));
    assert!(discoveries.iter().all(|d| d["gps"]["latitude"] == 51.5007));

    // manual results are not counted as emitted discoveries
    let status = fixture.get("/api/v1/scanner/status").await;
    assert_json_path!(status.body, "discoveries_total", json!(0));
}

#[tokio::test]
async fn test_manual_scan_on_bare_host_is_empty() {
    let fixture = TestFixture::bare().await;
    fixture.post_empty("/api/v1/dependencies/check").await;

    let response = fixture.post_empty("/api/v1/scanner/scan").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(0));
}

// =============================================================================
// Dependencies
// =============================================================================

#[tokio::test]
async fn test_dependencies_unchecked_then_checked() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/dependencies").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.body["checked_at"].is_null());

    let response = fixture.post_empty("/api/v1/dependencies/check").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.body["checked_at"].is_string());
    let tools = response.body["tools"].as_array().unwrap();
    let hcitool = tools.iter().find(|t| t["tool"] == "hcitool").unwrap();
    assert_eq!(hcitool["available"], true);

    let response = fixture.get("/api/v1/dependencies").await;
    assert!(response.body["checked_at"].is_string());
}

// =============================================================================
// Audio
// =============================================================================

#[tokio::test]
async fn test_audio_start_tune_stop() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/audio/start",
            json!({ "frequency_hz": 96_100_000, "mode": "wfm", "gain": 40 }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "active", json!(true));
    assert_json_path!(response.body, "sink", json!("aplay"));
    assert_json_path!(response.body, "mode", json!("wfm"));

    let response = fixture.get("/api/v1/audio").await;
    assert_json_path!(response.body, "frequency_hz", json!(96_100_000));

    let response = fixture
        .post("/api/v1/audio/tune", json!({ "frequency_hz": 101_100_000 }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "frequency_hz", json!(101_100_000));
    assert_json_path!(response.body, "mode", json!("wfm"));
    assert_eq!(fixture.backend.spawn_count().await, 2);
    assert_eq!(fixture.backend.live_count().await, 1);

    let response = fixture.post_empty("/api/v1/audio/stop").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "active", json!(false));
    assert_eq!(fixture.backend.live_count().await, 0);
}

#[tokio::test]
async fn test_audio_stop_without_session() {
    let fixture = TestFixture::bare().await;

    let response = fixture.post_empty("/api/v1/audio/stop").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "active", json!(false));
}

#[tokio::test]
async fn test_audio_missing_sink_is_unavailable() {
    let fixture = TestFixture::new().await;
    fixture.runner.remove_available(APLAY).await;

    let response = fixture
        .post("/api/v1/audio/start", json!({ "frequency_hz": 162_550_000 }))
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    let error = response.body["error"].as_str().unwrap();
    assert!(error.contains("apt-get install -y alsa-utils"));
    assert_eq!(fixture.backend.spawn_count().await, 0);
}

#[tokio::test]
async fn test_audio_out_of_range_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/audio/start", json!({ "frequency_hz": 2_400_000_000u64 }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("frequency"));
}

#[tokio::test]
async fn test_audio_malformed_bodies() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw("/api/v1/audio/start", "{not json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture.post("/api/v1/audio/start", json!({ "mode": "wfm" })).await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = fixture
        .post("/api/v1/audio/start", json!({ "frequency_hz": 96_100_000, "gain": "loud" }))
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fixture.backend.spawn_count().await, 0);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_exposition() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("sigint_scanner_running 0"));
    assert!(response.text.contains("sigint_http_requests_total"));
    assert!(response.text.contains("path=\"/api/v1/health\""));
}
