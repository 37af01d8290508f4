//! Download cache API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{error, info};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
    pub reclaimed_bytes: u64,
    pub errors: Vec<String>,
}

/// POST /api/v1/cache/clear
///
/// Stop every session and engine job, then delete everything in the
/// download directory.
pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Json<ClearCacheResponse>, ApiError> {
    state.sessions().stop_all().await;

    let report = state.quota().wipe().await.map_err(|e| {
        error!(error = %e, "Cache wipe failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!(removed = report.removed.len(), "Cache cleared on request");

    Ok(Json(ClearCacheResponse {
        removed: report.removed.len(),
        reclaimed_bytes: report.reclaimed(),
        errors: report.errors,
    }))
}
