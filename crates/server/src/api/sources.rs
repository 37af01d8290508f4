//! Torrent source search API handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use cinebridge_core::{MediaKind, SourceQuery, TorrentCandidate};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchSourcesRequest {
    pub query: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub kind: Option<MediaKind>,
}

#[derive(Debug, Serialize)]
pub struct SearchSourcesResponse {
    pub candidates: Vec<TorrentCandidate>,
    pub count: usize,
}

/// POST /api/v1/sources/search
///
/// Fan out to every provider and return the ranked, de-duplicated candidates.
/// Nothing found is an empty list, never an error.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchSourcesRequest>,
) -> Json<SearchSourcesResponse> {
    let mut query = SourceQuery::new(request.query);
    if let Some(imdb_id) = request.imdb_id.filter(|id| !id.is_empty()) {
        query = query.with_imdb_id(imdb_id);
    }
    if let Some(kind) = request.kind {
        query = query.with_kind(kind);
    }

    let candidates = state.aggregator().ranked_sources(&query).await;
    info!(query = %query.query, results = candidates.len(), "Source search complete");

    Json(SearchSourcesResponse {
        count: candidates.len(),
        candidates,
    })
}
