//! YTS movie API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::searcher::lenient::{u32_or_zero, u64_or_zero};
use crate::searcher::magnet::{build_magnet, normalize_info_hash, strip_trailing_year};
use crate::searcher::{ProviderError, ProviderKind, SourceQuery, TorrentCandidate, TorrentProvider};

use super::{send_json, SourceRecord};

#[derive(Debug, Deserialize)]
struct YtsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    // absent when nothing matched
    #[serde(default)]
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YtsMovie {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub year: u32,
    #[serde(default)]
    pub imdb_code: Option<String>,
    #[serde(default)]
    pub torrents: Vec<YtsTorrent>,
}

/// One encode of a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct YtsTorrent {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default, rename = "type")]
    pub release_type: String,
    #[serde(default)]
    pub video_codec: String,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub seeds: u32,
    #[serde(default, deserialize_with = "u32_or_zero")]
    pub peers: u32,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub size_bytes: u64,
}

impl YtsMovie {
    pub fn normalize(self) -> Vec<TorrentCandidate> {
        let imdb_id = self.imdb_code.filter(|id| !id.is_empty());
        let title = self.title;
        let year = self.year;

        self.torrents
            .into_iter()
            .filter_map(|t| {
                let info_hash = normalize_info_hash(&t.hash)?;
                let name = [
                    format!("{} ({})", title, year),
                    t.quality,
                    t.release_type,
                    t.video_codec,
                ]
                .iter()
                .filter(|part| !part.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
                let magnet_uri = build_magnet(&info_hash, &name);

                Some(TorrentCandidate {
                    name,
                    info_hash,
                    seeders: t.seeds,
                    leechers: t.peers,
                    size_bytes: t.size_bytes,
                    provider: ProviderKind::Yts,
                    category: Some("Movies".to_string()),
                    imdb_id: imdb_id.clone(),
                    magnet_uri,
                    score: 0.0,
                })
            })
            .collect()
    }
}

/// Movie-only provider.
pub struct YtsProvider {
    client: Client,
    base_url: String,
}

impl YtsProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// IMDb ids are exact; otherwise YTS matches titles and chokes on years.
    fn query_term(query: &SourceQuery) -> String {
        match query.imdb_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => strip_trailing_year(&query.query),
        }
    }
}

#[async_trait]
impl TorrentProvider for YtsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yts
    }

    fn accepts(&self, query: &SourceQuery) -> bool {
        !query.is_series()
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        let url = format!(
            "{}/list_movies.json?query_term={}",
            self.base_url,
            urlencoding::encode(&Self::query_term(query))
        );
        debug!(url = %url, "Searching YTS");

        let response: YtsResponse = send_json(self.client.get(&url)).await?;
        if response.status != "ok" {
            return Err(ProviderError::ApiError(
                response
                    .status_message
                    .unwrap_or_else(|| format!("status {}", response.status)),
            ));
        }

        Ok(response
            .data
            .and_then(|d| d.movies)
            .unwrap_or_default()
            .into_iter()
            .map(SourceRecord::Yts)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::MediaKind;

    const MOVIE: &str = r#"{
        "id": 1, "title": "Dune", "year": 2021, "imdb_code": "tt1160419",
        "torrents": [
            {"hash": "1111111111111111111111111111111111111111", "quality": "1080p", "type": "web",
             "video_codec": "x264", "seeds": 120, "peers": 30, "size_bytes": 2400000000},
            {"hash": "2222222222222222222222222222222222222222", "quality": "2160p", "type": "bluray",
             "video_codec": "x265", "seeds": "55", "peers": null, "size_bytes": "7100000000"},
            {"hash": "", "quality": "720p", "type": "web", "seeds": 1, "peers": 1}
        ]
    }"#;

    #[test]
    fn test_movie_flattens_variants() {
        let movie: YtsMovie = serde_json::from_str(MOVIE).unwrap();
        let candidates = movie.normalize();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Dune (2021) 1080p web x264");
        assert_eq!(candidates[1].name, "Dune (2021) 2160p bluray x265");
        assert_eq!(candidates[1].seeders, 55);
        assert_eq!(candidates[1].leechers, 0);
        assert_eq!(candidates[1].size_bytes, 7_100_000_000);
        assert!(candidates
            .iter()
            .all(|c| c.imdb_id.as_deref() == Some("tt1160419")));
    }

    #[test]
    fn test_empty_data_has_no_movies() {
        let response: YtsResponse =
            serde_json::from_str(r#"{"status":"ok","data":{"movie_count":0,"limit":20}}"#).unwrap();
        assert!(response.data.and_then(|d| d.movies).is_none());
    }

    #[test]
    fn test_query_term() {
        let by_title = SourceQuery::new("Dune 2021");
        assert_eq!(YtsProvider::query_term(&by_title), "Dune");

        let by_id = SourceQuery::new("Dune 2021").with_imdb_id("tt1160419");
        assert_eq!(YtsProvider::query_term(&by_id), "tt1160419");
    }

    #[test]
    fn test_declines_series() {
        let provider = YtsProvider::new(Client::new(), "http://localhost");
        assert!(!provider.accepts(&SourceQuery::new("x").with_kind(MediaKind::Series)));
        assert!(provider.accepts(&SourceQuery::new("x").with_kind(MediaKind::Movie)));
        assert!(provider.accepts(&SourceQuery::new("x")));
    }
}
