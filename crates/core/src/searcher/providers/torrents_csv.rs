//! torrents-csv.com search service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::searcher::lenient::{u32_or_zero, u64_or_zero};
use crate::searcher::magnet::{build_magnet, normalize_info_hash, strip_trailing_year};
use crate::searcher::{ProviderError, ProviderKind, SourceQuery, TorrentCandidate, TorrentProvider};

use super::{send_json, SourceRecord};

/// Older deployments return a bare array, newer ones wrap it with a cursor.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TorrentsCsvResponse {
    Bare(Vec<TorrentsCsvRecord>),
    Paged {
        #[serde(default)]
        torrents: Vec<TorrentsCsvRecord>,
    },
}

impl TorrentsCsvResponse {
    fn into_records(self) -> Vec<TorrentsCsvRecord> {
        match self {
            TorrentsCsvResponse::Paged { torrents } => torrents,
            TorrentsCsvResponse::Bare(torrents) => torrents,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentsCsvRecord {
    #[serde(default)]
    pub infohash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub size_bytes: u64,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub seeders: u32,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub leechers: u32,
}

impl TorrentsCsvRecord {
    pub fn normalize(self) -> Option<TorrentCandidate> {
        let info_hash = normalize_info_hash(&self.infohash)?;
        let magnet_uri = build_magnet(&info_hash, &self.name);

        Some(TorrentCandidate {
            name: self.name,
            info_hash,
            seeders: self.seeders,
            leechers: self.leechers,
            size_bytes: self.size_bytes,
            provider: ProviderKind::TorrentsCsv,
            category: None,
            imdb_id: None,
            magnet_uri,
            score: 0.0,
        })
    }
}

pub struct TorrentsCsvProvider {
    client: Client,
    base_url: String,
}

impl TorrentsCsvProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TorrentProvider for TorrentsCsvProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::TorrentsCsv
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        let url = format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&strip_trailing_year(&query.query))
        );
        debug!(url = %url, "Searching torrents-csv");

        let response: TorrentsCsvResponse = send_json(self.client.get(&url)).await?;
        Ok(response
            .into_records()
            .into_iter()
            .map(SourceRecord::TorrentsCsv)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_response() {
        let json = r#"{"torrents":[{"rowid":1,"infohash":"4444444444444444444444444444444444444444",
            "name":"Dune 2021 720p","size_bytes":900000000,"created_unix":1,"seeders":14,"leechers":2,
            "completed":100,"scraped_date":1}],"next":1}"#;
        let records = serde_json::from_str::<TorrentsCsvResponse>(json)
            .unwrap()
            .into_records();
        let c = records.into_iter().next().unwrap().normalize().unwrap();
        assert_eq!(c.name, "Dune 2021 720p");
        assert_eq!(c.seeders, 14);
        assert_eq!(c.provider, ProviderKind::TorrentsCsv);
    }

    #[test]
    fn test_bare_array_response() {
        let json = r#"[{"infohash":"4444444444444444444444444444444444444444","name":"A","seeders":"3"}]"#;
        let records = serde_json::from_str::<TorrentsCsvResponse>(json)
            .unwrap()
            .into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seeders, 3);
    }

    #[test]
    fn test_invalid_hash_dropped() {
        let record = TorrentsCsvRecord {
            infohash: "short".to_string(),
            name: "x".to_string(),
            size_bytes: 0,
            seeders: 0,
            leechers: 0,
        };
        assert!(record.normalize().is_none());
    }
}
