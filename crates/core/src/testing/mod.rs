//! Testing utilities and mock implementations.
//!
//! Mocks for every external boundary (engine, torrent providers, metadata
//! catalog, subtitle backends) so the session manager and the HTTP bridge can
//! be exercised without network or disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinebridge_core::testing::{MockEngine, MockProvider};
//!
//! let engine = Arc::new(MockEngine::new());
//! engine.register_files(MAGNET, vec![("S01E01.mkv", 1000), ("S01E02.mkv", 1000)]).await;
//!
//! let manager = SessionManager::new(engine.clone(), ProgressHub::default(), &config);
//! // ...
//! ```

mod mock_catalog;
mod mock_engine;
mod mock_provider;
mod mock_subtitles;

pub use mock_catalog::MockCatalog;
pub use mock_engine::MockEngine;
pub use mock_provider::MockProvider;
pub use mock_subtitles::MockSubtitleProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::MediaMeta;
    use crate::searcher::providers::{PirateBayRecord, TorrentsCsvRecord};
    use crate::searcher::{MediaKind, SourceRecord};
    use crate::subtitles::{SubtitleProviderKind, SubtitleTrack};

    /// A 40-character hash made of `c` repeated.
    pub fn hash(c: char) -> String {
        std::iter::repeat(c).take(40).collect()
    }

    /// Magnet for `hash(c)`.
    pub fn magnet(c: char, name: &str) -> String {
        format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            hash(c),
            urlencoding::encode(name)
        )
    }

    /// A raw PirateBay row in the "Video" category.
    pub fn piratebay_record(name: &str, hash_char: char, seeders: u32) -> SourceRecord {
        SourceRecord::PirateBay(PirateBayRecord {
            id: Some("1".to_string()),
            name: name.to_string(),
            info_hash: hash(hash_char).to_uppercase(),
            seeders,
            leechers: 1,
            size: 2 * 1024 * 1024 * 1024,
            category: Some("207".to_string()),
            imdb: None,
        })
    }

    pub fn torrents_csv_record(name: &str, hash_char: char, seeders: u32) -> SourceRecord {
        SourceRecord::TorrentsCsv(TorrentsCsvRecord {
            infohash: hash(hash_char),
            name: name.to_string(),
            size_bytes: 1024 * 1024 * 1024,
            seeders,
            leechers: 0,
        })
    }

    pub fn movie_meta(imdb_id: &str, title: &str, year: u32) -> MediaMeta {
        MediaMeta {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            year: Some(year),
            kind: MediaKind::Movie,
            poster: None,
            description: Some(format!("A movie about {}.", title.to_lowercase())),
        }
    }

    pub fn subtitle_track(id: &str, language: &str) -> SubtitleTrack {
        SubtitleTrack {
            id: id.to_string(),
            language: language.to_string(),
            release: None,
            url: format!("https://subs.example/{}.srt", id),
            provider: SubtitleProviderKind::Stremio,
        }
    }
}
