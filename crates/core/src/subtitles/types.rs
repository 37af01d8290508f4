//! Types for subtitle lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::searcher::MediaKind;

/// Errors that can occur inside a subtitle backend.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleProviderKind {
    OpenSubtitles,
    Stremio,
}

impl SubtitleProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleProviderKind::OpenSubtitles => "opensubtitles",
            SubtitleProviderKind::Stremio => "stremio",
        }
    }
}

impl fmt::Display for SubtitleProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to find subtitles for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleQuery {
    pub imdb_id: String,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// ISO 639-1 or 639-2 codes. Empty means any language.
    #[serde(default)]
    pub languages: Vec<String>,
}

impl SubtitleQuery {
    /// Whether a track in `language` was asked for.
    pub fn wants(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| language_matches(l, language))
    }
}

/// A downloadable subtitle track. Content is fetched by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub id: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub url: String,
    pub provider: SubtitleProviderKind,
}

/// A subtitle backend.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    fn kind(&self) -> SubtitleProviderKind;

    async fn search(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>, SubtitleError>;
}

// ISO 639-1 to the 639-2 codes (bibliographic and terminological) backends use.
const LANGUAGE_CODES: &[(&str, &[&str])] = &[
    ("ar", &["ara"]),
    ("de", &["ger", "deu"]),
    ("en", &["eng"]),
    ("es", &["spa"]),
    ("fr", &["fre", "fra"]),
    ("it", &["ita"]),
    ("ja", &["jpn"]),
    ("ko", &["kor"]),
    ("nl", &["dut", "nld"]),
    ("pl", &["pol"]),
    ("pt", &["por", "pob"]),
    ("ru", &["rus"]),
    ("sv", &["swe"]),
    ("tr", &["tur"]),
    ("zh", &["chi", "zho"]),
];

/// Compare language codes across ISO 639-1 and 639-2 spellings.
pub fn language_matches(requested: &str, actual: &str) -> bool {
    let requested = requested.trim().to_ascii_lowercase();
    let actual = actual.trim().to_ascii_lowercase();
    if requested == actual {
        return true;
    }

    LANGUAGE_CODES.iter().any(|(short, long)| {
        (requested == *short && long.contains(&actual.as_str()))
            || (actual == *short && long.contains(&requested.as_str()))
            || (long.contains(&requested.as_str()) && long.contains(&actual.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_matches() {
        assert!(language_matches("en", "eng"));
        assert!(language_matches("eng", "en"));
        assert!(language_matches("de", "ger"));
        assert!(language_matches("ger", "deu"));
        assert!(language_matches("EN", "en"));
        assert!(!language_matches("en", "fre"));
    }

    #[test]
    fn test_query_wants_any_when_empty() {
        let query = SubtitleQuery {
            imdb_id: "tt1".to_string(),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
            languages: vec![],
        };
        assert!(query.wants("xyz"));

        let query = SubtitleQuery {
            languages: vec!["fr".to_string()],
            ..query
        };
        assert!(query.wants("fre"));
        assert!(!query.wants("eng"));
    }
}
