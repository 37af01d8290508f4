//! Settings reload and bandwidth API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use cinebridge_core::{load_user_settings, ConfigError, UserSettings};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BandwidthRequest {
    /// 0 means unlimited.
    pub kilobytes_per_sec: u64,
}

#[derive(Debug, Serialize)]
pub struct BandwidthResponse {
    pub bytes_per_sec: u64,
}

/// PUT /api/v1/bandwidth
pub async fn update_bandwidth(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BandwidthRequest>,
) -> Json<BandwidthResponse> {
    let bytes_per_sec = request.kilobytes_per_sec.saturating_mul(1024);
    state
        .sessions()
        .update_bandwidth_limit(bytes_per_sec)
        .await;
    info!(bytes_per_sec, "Upload limit updated");
    Json(BandwidthResponse { bytes_per_sec })
}

/// Read the settings file and apply it to the running components.
pub async fn apply_settings(state: &AppState) -> Result<UserSettings, ConfigError> {
    let fallback = state.default_settings();
    let settings = match state.settings_path() {
        Some(path) => load_user_settings(path, &fallback).await?,
        None => fallback,
    };

    state.quota().set_limit(settings.cache_limit_bytes);
    state
        .sessions()
        .update_bandwidth_limit(settings.upload_limit_bytes_per_sec)
        .await;
    Ok(settings)
}

/// POST /api/v1/settings/reload
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<UserSettings>, ApiError> {
    let settings = apply_settings(&state)
        .await
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    info!(
        cache_limit = settings.cache_limit_bytes,
        upload_limit = settings.upload_limit_bytes_per_sec,
        "Settings reloaded"
    );
    Ok(Json(settings))
}
