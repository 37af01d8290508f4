//! Provider adapters for the five torrent search backends.
//!
//! Each adapter turns a [`SourceQuery`] into a provider-specific request and
//! decodes the response into a [`SourceRecord`] variant. Normalization into
//! [`TorrentCandidate`]s is pure and lives next to each record type.

mod eztv;
mod knaben;
mod piratebay;
mod torrents_csv;
mod yts;

pub use eztv::{EztvProvider, EztvTorrent};
pub use knaben::{KnabenHit, KnabenProvider};
pub use piratebay::{category_label, PirateBayProvider, PirateBayRecord};
pub use torrents_csv::{TorrentsCsvProvider, TorrentsCsvRecord};
pub use yts::{YtsMovie, YtsProvider, YtsTorrent};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProvidersConfig;

use super::{ProviderError, ProviderKind, TorrentCandidate, TorrentProvider};

/// A provider response record before normalization.
#[derive(Debug, Clone)]
pub enum SourceRecord {
    PirateBay(PirateBayRecord),
    Yts(YtsMovie),
    Eztv(EztvTorrent),
    TorrentsCsv(TorrentsCsvRecord),
    Knaben(KnabenHit),
}

impl SourceRecord {
    pub fn provider(&self) -> ProviderKind {
        match self {
            SourceRecord::PirateBay(_) => ProviderKind::PirateBay,
            SourceRecord::Yts(_) => ProviderKind::Yts,
            SourceRecord::Eztv(_) => ProviderKind::Eztv,
            SourceRecord::TorrentsCsv(_) => ProviderKind::TorrentsCsv,
            SourceRecord::Knaben(_) => ProviderKind::Knaben,
        }
    }

    /// Candidates described by this record. Records without a usable info hash
    /// yield nothing; a YTS movie yields one candidate per variant.
    pub fn normalize(self) -> Vec<TorrentCandidate> {
        match self {
            SourceRecord::PirateBay(r) => r.normalize().into_iter().collect(),
            SourceRecord::Yts(m) => m.normalize(),
            SourceRecord::Eztv(t) => t.normalize().into_iter().collect(),
            SourceRecord::TorrentsCsv(r) => r.normalize().into_iter().collect(),
            SourceRecord::Knaben(h) => h.normalize().into_iter().collect(),
        }
    }
}

/// Build the shared HTTP client used by every adapter.
pub fn build_client(config: &ProvidersConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs as u64))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| ProviderError::ConnectionFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Instantiate every enabled provider, in aggregation order.
pub fn from_config(config: &ProvidersConfig) -> Result<Vec<Arc<dyn TorrentProvider>>, ProviderError> {
    let client = build_client(config)?;
    let mut providers: Vec<Arc<dyn TorrentProvider>> = Vec::new();

    if config.piratebay.enabled {
        providers.push(Arc::new(PirateBayProvider::new(
            client.clone(),
            &config.piratebay.base_url,
        )));
    }
    if config.yts.enabled {
        providers.push(Arc::new(YtsProvider::new(client.clone(), &config.yts.base_url)));
    }
    if config.eztv.enabled {
        providers.push(Arc::new(EztvProvider::new(client.clone(), &config.eztv.base_url)));
    }
    if config.torrents_csv.enabled {
        providers.push(Arc::new(TorrentsCsvProvider::new(
            client.clone(),
            &config.torrents_csv.base_url,
        )));
    }
    if config.knaben.enabled {
        providers.push(Arc::new(KnabenProvider::new(client, &config.knaben.base_url)));
    }

    Ok(providers)
}

/// Send `request` and decode a JSON body, mapping failures to [`ProviderError`].
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))
}
