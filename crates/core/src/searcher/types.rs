//! Types for the torrent source aggregation system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::providers::SourceRecord;

/// Torrent search backends known to the aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    PirateBay,
    Yts,
    Eztv,
    TorrentsCsv,
    Knaben,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::PirateBay => "piratebay",
            ProviderKind::Yts => "yts",
            ProviderKind::Eztv => "eztv",
            ProviderKind::TorrentsCsv => "torrents_csv",
            ProviderKind::Knaben => "knaben",
        }
    }

    /// Score bonus reflecting how reliable the provider's listings are.
    pub fn trust_bonus(&self) -> f64 {
        match self {
            ProviderKind::Yts | ProviderKind::Eztv => 50.0,
            ProviderKind::PirateBay => 20.0,
            ProviderKind::TorrentsCsv | ProviderKind::Knaben => 10.0,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of media being searched for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

/// Query parameters for a source search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceQuery {
    /// Free-text title, usually "Title Year".
    pub query: String,
    /// IMDb id (`tt` followed by digits), when the title is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Unknown kind means every provider is asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
}

impl SourceQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            imdb_id: None,
            kind: None,
        }
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_movie(&self) -> bool {
        self.kind == Some(MediaKind::Movie)
    }

    pub fn is_series(&self) -> bool {
        self.kind == Some(MediaKind::Series)
    }
}

/// A normalized, scored torrent listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentCandidate {
    /// Release title with its free-text quality and codec tags.
    pub name: String,
    /// Lowercase 40-char hex. Identity of the content.
    pub info_hash: String,
    pub seeders: u32,
    pub leechers: u32,
    pub size_bytes: u64,
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Magnet with the fallback trackers appended.
    pub magnet_uri: String,
    /// Assigned by the filter stage.
    #[serde(default)]
    pub score: f64,
}

/// Errors raised inside a provider adapter. They never escape the aggregator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::ConnectionFailed(e.to_string())
        } else {
            ProviderError::ApiError(e.to_string())
        }
    }
}

/// A torrent search backend.
#[async_trait]
pub trait TorrentProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether this provider has anything useful to say about `query`.
    /// Declined queries cost no network call.
    fn accepts(&self, query: &SourceQuery) -> bool {
        let _ = query;
        true
    }

    /// Fetch raw records for `query`.
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError>;
}
