//! EZTV series API, queried by IMDb id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::searcher::lenient::{string_or_number, u32_or_zero, u64_or_zero};
use crate::searcher::magnet::{
    build_magnet, info_hash_from_magnet, is_valid_imdb_id, normalize_info_hash,
    with_fallback_trackers,
};
use crate::searcher::{ProviderError, ProviderKind, SourceQuery, TorrentCandidate, TorrentProvider};

use super::{send_json, SourceRecord};

#[derive(Debug, Deserialize)]
struct EztvResponse {
    #[serde(default)]
    torrents: Option<Vec<EztvTorrent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EztvTorrent {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub magnet_url: Option<String>,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub seeds: u32,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub peers: u32,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub size_bytes: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub imdb_id: Option<String>,
}

impl EztvTorrent {
    pub fn normalize(self) -> Option<TorrentCandidate> {
        let info_hash = normalize_info_hash(&self.hash)
            .or_else(|| self.magnet_url.as_deref().and_then(info_hash_from_magnet))?;
        let name = if self.title.is_empty() {
            self.filename
        } else {
            self.title
        };
        let magnet_uri = match self.magnet_url.as_deref().filter(|m| m.starts_with("magnet:")) {
            Some(magnet) => with_fallback_trackers(magnet),
            None => build_magnet(&info_hash, &name),
        };
        // EZTV reports the numeric part only
        let imdb_id = self
            .imdb_id
            .filter(|id| !id.is_empty() && id != "0")
            .map(|id| if id.starts_with("tt") { id } else { format!("tt{}", id) });

        Some(TorrentCandidate {
            name,
            info_hash,
            seeders: self.seeds,
            leechers: self.peers,
            size_bytes: self.size_bytes,
            provider: ProviderKind::Eztv,
            category: Some("TV".to_string()),
            imdb_id,
            magnet_uri,
            score: 0.0,
        })
    }
}

/// Series-only provider. Requires a well-formed IMDb id.
pub struct EztvProvider {
    client: Client,
    base_url: String,
}

impl EztvProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TorrentProvider for EztvProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Eztv
    }

    fn accepts(&self, query: &SourceQuery) -> bool {
        !query.is_movie()
            && query
                .imdb_id
                .as_deref()
                .map(is_valid_imdb_id)
                .unwrap_or(false)
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        let digits = query
            .imdb_id
            .as_deref()
            .and_then(|id| id.strip_prefix("tt"))
            .ok_or_else(|| ProviderError::ApiError("EZTV requires an IMDb id".to_string()))?;

        let url = format!("{}/get-torrents?imdb_id={}", self.base_url, digits);
        debug!(url = %url, "Searching EZTV");

        let response: EztvResponse = send_json(self.client.get(&url)).await?;
        Ok(response
            .torrents
            .unwrap_or_default()
            .into_iter()
            .map(SourceRecord::Eztv)
            .collect())
    }
}
