//! apibay.org (The Pirate Bay JSON API).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::searcher::lenient::{string_or_number, u32_or_zero, u64_or_zero};
use crate::searcher::magnet::{build_magnet, normalize_info_hash};
use crate::searcher::{ProviderError, ProviderKind, SourceQuery, TorrentCandidate, TorrentProvider};

use super::{send_json, SourceRecord};

/// One row of a `q.php` response. Every field arrives as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct PirateBayRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub info_hash: String,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub seeders: u32,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub leechers: u32,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub size: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category: Option<String>,
    #[serde(default)]
    pub imdb: Option<String>,
}

impl PirateBayRecord {
    /// The single row apibay returns when nothing matched.
    pub fn is_sentinel(&self) -> bool {
        self.id.as_deref() == Some("0") || self.name == "No results returned"
    }

    pub fn normalize(self) -> Option<TorrentCandidate> {
        if self.is_sentinel() {
            return None;
        }
        let info_hash = normalize_info_hash(&self.info_hash)?;
        let magnet_uri = build_magnet(&info_hash, &self.name);

        Some(TorrentCandidate {
            name: self.name,
            info_hash,
            seeders: self.seeders,
            leechers: self.leechers,
            size_bytes: self.size,
            provider: ProviderKind::PirateBay,
            category: self.category.as_deref().and_then(category_label).map(String::from),
            imdb_id: self.imdb.filter(|id| !id.is_empty()),
            magnet_uri,
            score: 0.0,
        })
    }
}

/// Map a numeric apibay category code (e.g. `"207"`) to its top-level label.
pub fn category_label(code: &str) -> Option<&'static str> {
    let code: u32 = code.trim().parse().ok()?;
    match code / 100 {
        1 => Some("Audio"),
        2 => Some("Video"),
        3 => Some("Applications"),
        4 => Some("Games"),
        5 => Some("Adult"),
        6 => Some("Other"),
        _ => None,
    }
}

/// General-purpose provider; accepts every query.
pub struct PirateBayProvider {
    client: Client,
    base_url: String,
}

impl PirateBayProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TorrentProvider for PirateBayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::PirateBay
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        let url = format!(
            "{}/q.php?q={}&cat=0",
            self.base_url,
            urlencoding::encode(query.query.trim())
        );
        debug!(url = %url, "Searching PirateBay");

        let records: Vec<PirateBayRecord> = send_json(self.client.get(&url)).await?;
        Ok(records.into_iter().map(SourceRecord::PirateBay).collect())
    }
}
