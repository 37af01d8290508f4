//! OpenSubtitles v3 Stremio addon. Keyless.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SubtitleError, SubtitleProvider, SubtitleProviderKind, SubtitleQuery, SubtitleTrack};
use crate::config::StremioSubtitlesConfig;
use crate::searcher::MediaKind;

#[derive(Debug, Deserialize)]
struct AddonResponse {
    #[serde(default)]
    subtitles: Vec<AddonSubtitle>,
}

#[derive(Debug, Deserialize)]
struct AddonSubtitle {
    #[serde(default)]
    id: String,
    url: String,
    #[serde(default)]
    lang: String,
}

pub struct StremioSubtitlesClient {
    client: Client,
    base_url: String,
}

impl StremioSubtitlesClient {
    pub fn new(config: &StremioSubtitlesConfig) -> Result<Self, SubtitleError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Stremio video id: `tt123` for movies, `tt123:season:episode` for episodes.
    fn video_id(query: &SubtitleQuery) -> String {
        match (query.kind, query.season, query.episode) {
            (MediaKind::Series, Some(season), Some(episode)) => {
                format!("{}:{}:{}", query.imdb_id, season, episode)
            }
            _ => query.imdb_id.clone(),
        }
    }
}

#[async_trait]
impl SubtitleProvider for StremioSubtitlesClient {
    fn kind(&self) -> SubtitleProviderKind {
        SubtitleProviderKind::Stremio
    }

    async fn search(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>, SubtitleError> {
        let url = format!(
            "{}/subtitles/{}/{}.json",
            self.base_url,
            query.kind.as_str(),
            Self::video_id(query)
        );
        debug!("Stremio subtitles: url={}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubtitleError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let result: AddonResponse = response.json().await.map_err(|e| {
            SubtitleError::ParseError(format!("Failed to parse addon response: {}", e))
        })?;

        Ok(result
            .subtitles
            .into_iter()
            .filter(|s| query.wants(&s.lang))
            .map(|s| SubtitleTrack {
                id: s.id,
                language: s.lang,
                release: None,
                url: s.url,
                provider: SubtitleProviderKind::Stremio,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id() {
        let mut query = SubtitleQuery {
            imdb_id: "tt11280740".to_string(),
            kind: MediaKind::Series,
            season: Some(1),
            episode: Some(3),
            languages: vec![],
        };
        assert_eq!(StremioSubtitlesClient::video_id(&query), "tt11280740:1:3");

        query.kind = MediaKind::Movie;
        assert_eq!(StremioSubtitlesClient::video_id(&query), "tt11280740");
    }

    #[test]
    fn test_addon_response_parse() {
        let json = r#"{"subtitles":[{"id":"1","url":"https://x/1.srt","lang":"eng","SubEncoding":"UTF-8"}]}"#;
        let response: AddonResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.subtitles[0].lang, "eng");
    }
}
