//! Knaben meta-search API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::searcher::lenient::{u32_or_zero, u64_or_zero};
use crate::searcher::magnet::{
    build_magnet, info_hash_from_magnet, normalize_info_hash, strip_trailing_year,
    with_fallback_trackers,
};
use crate::searcher::{ProviderError, ProviderKind, SourceQuery, TorrentCandidate, TorrentProvider};

use super::{send_json, SourceRecord};

const PAGE_SIZE: u32 = 50;

#[derive(Debug, Serialize)]
struct KnabenRequest<'a> {
    search_type: &'a str,
    search_field: &'a str,
    query: &'a str,
    order_by: &'a str,
    order_direction: &'a str,
    size: u32,
    hide_unsafe: bool,
    hide_xxx: bool,
}

#[derive(Debug, Deserialize)]
struct KnabenResponse {
    #[serde(default)]
    hits: Vec<KnabenHit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnabenHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub magnet_url: Option<String>,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub seeders: u32,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub peers: u32,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub bytes: u64,
    #[serde(default)]
    pub category: Option<String>,
}

impl KnabenHit {
    pub fn normalize(self) -> Option<TorrentCandidate> {
        let info_hash = self
            .hash
            .as_deref()
            .and_then(normalize_info_hash)
            .or_else(|| self.magnet_url.as_deref().and_then(info_hash_from_magnet))?;
        let magnet_uri = match self.magnet_url.as_deref().filter(|m| m.starts_with("magnet:")) {
            Some(magnet) => with_fallback_trackers(magnet),
            None => build_magnet(&info_hash, &self.title),
        };

        Some(TorrentCandidate {
            name: self.title,
            info_hash,
            seeders: self.seeders,
            leechers: self.peers,
            size_bytes: self.bytes,
            provider: ProviderKind::Knaben,
            category: self.category.filter(|c| !c.is_empty()),
            imdb_id: None,
            magnet_uri,
            score: 0.0,
        })
    }
}

pub struct KnabenProvider {
    client: Client,
    url: String,
}

impl KnabenProvider {
    /// `base_url` is the full API endpoint; Knaben takes a POST on the root.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TorrentProvider for KnabenProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Knaben
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        let title = strip_trailing_year(&query.query);
        let body = KnabenRequest {
            search_type: "100%",
            search_field: "title",
            query: &title,
            order_by: "seeders",
            order_direction: "desc",
            size: PAGE_SIZE,
            hide_unsafe: true,
            hide_xxx: true,
        };
        debug!(url = %self.url, query = %title, "Searching Knaben");

        let response: KnabenResponse = send_json(self.client.post(&self.url).json(&body)).await?;
        Ok(response.hits.into_iter().map(SourceRecord::Knaben).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hit() {
        let json = r#"{"hits":[
            {"title":"Dune.2021.2160p.HDR","hash":"5555555555555555555555555555555555555555",
             "magnetUrl":null,"seeders":"44","peers":3,"bytes":12000000000,"category":"Movies"},
            {"title":"No Hash","hash":null,"magnetUrl":"http://not-a-magnet","seeders":1}
        ],"total":{"value":2}}"#;
        let response: KnabenResponse = serde_json::from_str(json).unwrap();
        let candidates: Vec<_> = response
            .hits
            .into_iter()
            .filter_map(|h| h.normalize())
            .collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].seeders, 44);
        assert_eq!(candidates[0].category.as_deref(), Some("Movies"));
        assert!(candidates[0]
            .magnet_uri
            .starts_with("magnet:?xt=urn:btih:5555555555555555555555555555555555555555&dn="));
    }

    #[test]
    fn test_request_body_shape() {
        let body = KnabenRequest {
            search_type: "100%",
            search_field: "title",
            query: "Dune",
            order_by: "seeders",
            order_direction: "desc",
            size: PAGE_SIZE,
            hide_unsafe: true,
            hide_xxx: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "Dune");
        assert_eq!(json["hide_xxx"], true);
    }
}
