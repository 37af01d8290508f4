//! Subtitle track discovery across backends.

mod opensubtitles;
mod stremio;
mod types;

pub use opensubtitles::OpenSubtitlesClient;
pub use stremio::StremioSubtitlesClient;
pub use types::*;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ProvidersConfig, SubtitlesConfig};
use crate::metrics::EXTERNAL_SERVICE_REQUESTS;

/// Fans a query out to every subtitle backend; failures contribute nothing.
pub struct SubtitleAggregator {
    providers: Vec<Arc<dyn SubtitleProvider>>,
}

impl SubtitleAggregator {
    pub fn new(providers: Vec<Arc<dyn SubtitleProvider>>) -> Self {
        Self { providers }
    }

    /// Build the configured backends. OpenSubtitles is skipped without an API key.
    pub fn from_config(
        config: &SubtitlesConfig,
        providers: &ProvidersConfig,
    ) -> Result<Self, SubtitleError> {
        let mut backends: Vec<Arc<dyn SubtitleProvider>> = Vec::new();

        if config.opensubtitles.api_key.is_empty() {
            info!("OpenSubtitles API key not set, skipping backend");
        } else {
            backends.push(Arc::new(OpenSubtitlesClient::new(
                &config.opensubtitles,
                &providers.user_agent,
            )?));
        }
        if config.stremio.enabled {
            backends.push(Arc::new(StremioSubtitlesClient::new(&config.stremio)?));
        }

        Ok(Self::new(backends))
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub async fn search(&self, query: &SubtitleQuery) -> Vec<SubtitleTrack> {
        let results = futures::future::join_all(self.providers.iter().map(|p| async move {
            (p.kind(), p.search(query).await)
        }))
        .await;

        let mut tracks: Vec<SubtitleTrack> = Vec::new();
        for (kind, result) in results {
            match result {
                Ok(found) => {
                    EXTERNAL_SERVICE_REQUESTS
                        .with_label_values(&[kind.as_str(), "subtitles", "success"])
                        .inc();
                    debug!(provider = %kind, results = found.len(), "Subtitle search complete");
                    for track in found {
                        if !tracks.iter().any(|t| t.url == track.url) {
                            tracks.push(track);
                        }
                    }
                }
                Err(e) => {
                    EXTERNAL_SERVICE_REQUESTS
                        .with_label_values(&[kind.as_str(), "subtitles", "error"])
                        .inc();
                    warn!(provider = %kind, error = %e, "Subtitle search failed");
                }
            }
        }
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProvidersConfig, SubtitlesConfig};

    #[test]
    fn test_from_config_without_key_uses_stremio_only() {
        let aggregator =
            SubtitleAggregator::from_config(&SubtitlesConfig::default(), &ProvidersConfig::default())
                .unwrap();
        assert_eq!(aggregator.provider_count(), 1);
    }

    #[test]
    fn test_from_config_with_key() {
        let mut config = SubtitlesConfig::default();
        config.opensubtitles.api_key = "secret".to_string();
        let aggregator =
            SubtitleAggregator::from_config(&config, &ProvidersConfig::default()).unwrap();
        assert_eq!(aggregator.provider_count(), 2);
    }
}
