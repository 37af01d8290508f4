//! Subtitle lookup API handler.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use cinebridge_core::searcher::magnet::is_valid_imdb_id;
use cinebridge_core::{MediaKind, SubtitleQuery, SubtitleTrack};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubtitleParams {
    #[serde(default)]
    pub kind: Option<MediaKind>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Comma-separated language codes; the configured languages when absent.
    #[serde(default)]
    pub languages: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtitleResponse {
    pub tracks: Vec<SubtitleTrack>,
    pub count: usize,
}

/// GET /api/v1/subtitles/{imdb_id}
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(imdb_id): Path<String>,
    Query(params): Query<SubtitleParams>,
) -> Result<Json<SubtitleResponse>, ApiError> {
    if !is_valid_imdb_id(&imdb_id) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid IMDb id: {}", imdb_id),
        ));
    }

    let languages = match params.languages {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        None => state.config().subtitles.languages.clone(),
    };
    let kind = params.kind.unwrap_or(if params.season.is_some() {
        MediaKind::Series
    } else {
        MediaKind::Movie
    });

    let query = SubtitleQuery {
        imdb_id,
        kind,
        season: params.season,
        episode: params.episode,
        languages,
    };
    let tracks = state.subtitles().search(&query).await;

    Ok(Json(SubtitleResponse {
        count: tracks.len(),
        tracks,
    }))
}
