//! OpenSubtitles REST API (v1) client. Requires an API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SubtitleError, SubtitleProvider, SubtitleProviderKind, SubtitleQuery, SubtitleTrack};
use crate::config::OpenSubtitlesConfig;
use crate::searcher::MediaKind;

const DEFAULT_BASE_URL: &str = "https://api.opensubtitles.com/api/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SubtitleItem>,
}

#[derive(Debug, Deserialize)]
struct SubtitleItem {
    id: String,
    attributes: SubtitleAttributes,
}

#[derive(Debug, Deserialize)]
struct SubtitleAttributes {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// OpenSubtitles API client.
pub struct OpenSubtitlesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenSubtitlesClient {
    pub fn new(config: &OpenSubtitlesConfig, user_agent: &str) -> Result<Self, SubtitleError> {
        if config.api_key.is_empty() {
            return Err(SubtitleError::NotConfigured(
                "OpenSubtitles API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(user_agent.to_string())
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn query_params(query: &SubtitleQuery) -> Vec<(&'static str, String)> {
        let digits = query.imdb_id.trim_start_matches("tt").to_string();
        let mut params = Vec::new();

        match query.kind {
            MediaKind::Movie => params.push(("imdb_id", digits)),
            MediaKind::Series => {
                params.push(("parent_imdb_id", digits));
                if let Some(season) = query.season {
                    params.push(("season_number", season.to_string()));
                }
                if let Some(episode) = query.episode {
                    params.push(("episode_number", episode.to_string()));
                }
            }
        }
        if !query.languages.is_empty() {
            params.push(("languages", query.languages.join(",")));
        }
        params
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesClient {
    fn kind(&self) -> SubtitleProviderKind {
        SubtitleProviderKind::OpenSubtitles
    }

    async fn search(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>, SubtitleError> {
        let url = format!("{}/subtitles", self.base_url);
        debug!("OpenSubtitles search: imdb_id={}", query.imdb_id);

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .query(&Self::query_params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubtitleError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let result: SearchResponse = response.json().await.map_err(|e| {
            SubtitleError::ParseError(format!("Failed to parse subtitle search response: {}", e))
        })?;

        Ok(result
            .data
            .into_iter()
            .filter_map(|item| {
                let language = item.attributes.language?;
                let url = item.attributes.url?;
                Some(SubtitleTrack {
                    id: item.id,
                    language,
                    release: item.attributes.release,
                    url,
                    provider: SubtitleProviderKind::OpenSubtitles,
                })
            })
            .filter(|track| query.wants(&track.language))
            .collect())
    }
}
