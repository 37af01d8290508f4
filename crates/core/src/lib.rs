pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod searcher;
pub mod stream;
pub mod subtitles;
pub mod testing;

pub use cache::{QuotaEnforcer, QuotaError, QuotaReport};
pub use catalog::{CatalogError, CinemetaClient, MediaMeta, MetadataCatalog};
pub use config::{
    load_config, load_config_from_str, load_user_settings, validate_config, Config, ConfigError,
    SanitizedConfig, UserSettings,
};
pub use engine::{EngineError, JobFile, JobHandle, JobStats, LibrqbitEngine, TorrentEngine};
pub use searcher::{
    dedup_and_rank, MediaKind, ProviderKind, SourceAggregator, SourceQuery, TorrentCandidate,
    TorrentProvider,
};
pub use stream::{
    FileChoice, ProgressEvent, ProgressHub, SessionInfo, SessionManager, SessionStatus,
    StartOutcome, StreamError,
};
pub use subtitles::{SubtitleAggregator, SubtitleProvider, SubtitleQuery, SubtitleTrack};
