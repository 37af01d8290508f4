use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cinebridge_core::{
    Config, MetadataCatalog, QuotaEnforcer, SanitizedConfig, SessionManager, SourceAggregator,
    SubtitleAggregator, UserSettings,
};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: SourceAggregator,
    sessions: Arc<SessionManager>,
    quota: Arc<QuotaEnforcer>,
    subtitles: SubtitleAggregator,
    catalog: Arc<dyn MetadataCatalog>,
}

impl AppState {
    pub fn new(
        config: Config,
        aggregator: SourceAggregator,
        sessions: Arc<SessionManager>,
        quota: Arc<QuotaEnforcer>,
        subtitles: SubtitleAggregator,
        catalog: Arc<dyn MetadataCatalog>,
    ) -> Self {
        Self {
            config,
            aggregator,
            sessions,
            quota,
            subtitles,
            catalog,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &SourceAggregator {
        &self.aggregator
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn quota(&self) -> &Arc<QuotaEnforcer> {
        &self.quota
    }

    pub fn subtitles(&self) -> &SubtitleAggregator {
        &self.subtitles
    }

    pub fn catalog(&self) -> &dyn MetadataCatalog {
        self.catalog.as_ref()
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.config.settings.path.as_deref()
    }

    /// Settings used when the settings file is missing or unset.
    pub fn default_settings(&self) -> UserSettings {
        UserSettings::from_config(&self.config)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.config.stream.start_timeout_secs)
    }
}
