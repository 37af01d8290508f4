//! Types for metadata lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::searcher::MediaKind;

/// Errors that can occur when querying the metadata catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Normalized title metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMeta {
    pub imdb_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MediaMeta {
    /// Query string for source search: `"Title Year"`.
    pub fn source_query(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// A metadata backend.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<MediaMeta>, CatalogError>;

    async fn meta(&self, imdb_id: &str, kind: MediaKind) -> Result<MediaMeta, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_query() {
        let meta = MediaMeta {
            imdb_id: "tt1160419".to_string(),
            title: "Dune".to_string(),
            year: Some(2021),
            kind: MediaKind::Movie,
            poster: None,
            description: None,
        };
        assert_eq!(meta.source_query(), "Dune 2021");

        let undated = MediaMeta { year: None, ..meta };
        assert_eq!(undated.source_query(), "Dune");
    }
}
