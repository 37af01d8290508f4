//! Metadata search API handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use cinebridge_core::{MediaKind, MediaMeta};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogSearchParams {
    pub query: String,
    #[serde(default)]
    pub kind: Option<MediaKind>,
}

#[derive(Debug, Serialize)]
pub struct CatalogSearchResponse {
    pub results: Vec<MediaMeta>,
    pub count: usize,
}

/// GET /api/v1/catalog/search
///
/// Catalog failures degrade to an empty list.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogSearchParams>,
) -> Json<CatalogSearchResponse> {
    let kind = params.kind.unwrap_or(MediaKind::Movie);
    let results = if params.query.trim().is_empty() {
        Vec::new()
    } else {
        match state.catalog().search(params.query.trim(), kind).await {
            Ok(results) => results,
            Err(e) => {
                warn!(catalog = state.catalog().name(), error = %e, "Catalog search failed");
                Vec::new()
            }
        }
    };

    Json(CatalogSearchResponse {
        count: results.len(),
        results,
    })
}
