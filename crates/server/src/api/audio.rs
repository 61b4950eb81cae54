//! Audio demodulation handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::warn;

use sigint_core::{AudioError, AudioRequest, AudioSessionState, TuneRequest};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type AudioResult = Result<Json<AudioSessionState>, (StatusCode, Json<ErrorResponse>)>;

/// Map a start or tune outcome onto a response.
///
/// Invalid parameters are a 400. A session that could not start (tools
/// missing, spawn failed) is a 503 carrying the remediation message.
fn respond(result: Result<AudioSessionState, AudioError>) -> AudioResult {
    match result {
        Ok(session) if session.active => Ok(Json(session)),
        Ok(session) => {
            let error = session
                .error
                .unwrap_or_else(|| "Audio session did not start".to_string());
            warn!("Audio start refused: {}", error);
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::new(error))))
        }
        Err(AudioError::InvalidRequest(message)) => {
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))))
        }
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// GET /api/v1/audio
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<AudioSessionState> {
    Json(state.orchestrator().audio_status().await)
}

/// POST /api/v1/audio/start
///
/// Replaces any live session.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AudioRequest>,
) -> AudioResult {
    respond(state.orchestrator().start_audio(body).await)
}

/// POST /api/v1/audio/stop
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<AudioSessionState> {
    Json(state.orchestrator().stop_audio().await)
}

/// POST /api/v1/audio/tune
///
/// Retunes the live session, keeping parameters the body omits.
pub async fn tune(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TuneRequest>,
) -> AudioResult {
    respond(state.orchestrator().tune_audio(body).await)
}
