//! Streaming session API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use cinebridge_core::{EngineError, SessionInfo, StartOutcome, StreamError};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartStreamRequest {
    pub identifier: String,
    #[serde(default)]
    pub file_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StopStreamRequest {
    pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct StopStreamResponse {
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct ActiveStreamResponse {
    pub active: Option<SessionInfo>,
}

fn stream_error(error: StreamError) -> ApiError {
    let status = match &error {
        StreamError::Engine(EngineError::InvalidMagnet(_)) => StatusCode::BAD_REQUEST,
        StreamError::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
        StreamError::Engine(_) => StatusCode::BAD_GATEWAY,
        StreamError::InvalidFileIndex(_) => StatusCode::BAD_REQUEST,
        StreamError::NoFiles => StatusCode::UNPROCESSABLE_ENTITY,
        StreamError::Bind(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StreamError::Superseded(_) => StatusCode::CONFLICT,
    };
    api_error(status, error.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/streams/start
///
/// Start or resume streaming a magnet. Gives up after the configured start
/// timeout, stopping the half-started session.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartStreamRequest>,
) -> Result<Json<StartOutcome>, ApiError> {
    let identifier = request.identifier.trim();
    if identifier.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "identifier is required"));
    }

    let sessions = state.sessions();
    match tokio::time::timeout(
        state.start_timeout(),
        sessions.start(identifier, request.file_index),
    )
    .await
    {
        Ok(Ok(outcome)) => Ok(Json(outcome)),
        Ok(Err(e)) => Err(stream_error(e)),
        Err(_) => {
            warn!(identifier = %identifier, "Stream start timed out");
            sessions.stop(identifier).await;
            Err(api_error(
                StatusCode::GATEWAY_TIMEOUT,
                "stream connection timed out",
            ))
        }
    }
}

/// POST /api/v1/streams/stop
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StopStreamRequest>,
) -> Json<StopStreamResponse> {
    let stopped = state.sessions().stop(request.identifier.trim()).await;
    Json(StopStreamResponse { stopped })
}

/// POST /api/v1/streams/stop-active
pub async fn stop_active(State(state): State<Arc<AppState>>) -> Json<StopStreamResponse> {
    let stopped = state.sessions().stop_active().await;
    Json(StopStreamResponse { stopped })
}

/// GET /api/v1/streams/active
pub async fn active(State(state): State<Arc<AppState>>) -> Json<ActiveStreamResponse> {
    Json(ActiveStreamResponse {
        active: state.sessions().active().await,
    })
}
