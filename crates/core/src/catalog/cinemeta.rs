//! Cinemeta (Stremio metadata addon) client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogError, MediaMeta, MetadataCatalog};
use crate::config::CatalogConfig;
use crate::searcher::MediaKind;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    metas: Vec<CinemetaMeta>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Option<CinemetaMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CinemetaMeta {
    #[serde(default)]
    id: String,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    name: String,
    /// "2021", or "2019–2022" for series.
    #[serde(default)]
    release_info: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl CinemetaMeta {
    fn into_meta(self, kind: MediaKind) -> Option<MediaMeta> {
        let imdb_id = self
            .imdb_id
            .filter(|id| id.starts_with("tt"))
            .unwrap_or(self.id);
        if !imdb_id.starts_with("tt") || self.name.is_empty() {
            return None;
        }

        Some(MediaMeta {
            imdb_id,
            title: self.name,
            year: self.release_info.as_deref().and_then(parse_year),
            kind,
            poster: self.poster.filter(|p| !p.is_empty()),
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// First four-digit year in a release string.
fn parse_year(release_info: &str) -> Option<u32> {
    let digits: String = release_info
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

/// Cinemeta API client.
pub struct CinemetaClient {
    client: Client,
    base_url: String,
}

impl CinemetaClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            base_url: config.cinemeta_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, CatalogError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(CatalogError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl MetadataCatalog for CinemetaClient {
    fn name(&self) -> &str {
        "cinemeta"
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<MediaMeta>, CatalogError> {
        let url = format!(
            "{}/catalog/{}/top/search={}.json",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(query.trim())
        );
        debug!("Cinemeta search: query='{}', kind={}", query, kind.as_str());

        let response: CatalogResponse = self.get_json(&url, "catalog search").await?;
        Ok(response
            .metas
            .into_iter()
            .filter_map(|m| m.into_meta(kind))
            .collect())
    }

    async fn meta(&self, imdb_id: &str, kind: MediaKind) -> Result<MediaMeta, CatalogError> {
        let url = format!("{}/meta/{}/{}.json", self.base_url, kind.as_str(), imdb_id);
        debug!("Cinemeta meta: id={}, kind={}", imdb_id, kind.as_str());

        let response: MetaResponse = self.get_json(&url, imdb_id).await?;
        response
            .meta
            .and_then(|m| m.into_meta(kind))
            .ok_or_else(|| CatalogError::NotFound(imdb_id.to_string()))
    }
}
