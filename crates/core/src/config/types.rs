use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub subtitles: SubtitlesConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Bridge server configuration (the API the UI talks to)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    7878
}

/// Embedded torrent engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Shared download directory; also the unit the cache quota operates on.
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    /// Fixed peer listen port. None lets the engine pick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    /// Initial upload limit in bytes/second (0 = unlimited).
    #[serde(default)]
    pub upload_limit_bytes_per_sec: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            enable_dht: true,
            listen_port: None,
            upload_limit_bytes_per_sec: 0,
        }
    }
}

fn default_download_path() -> PathBuf {
    std::env::temp_dir().join("cinebridge")
}

fn default_true() -> bool {
    true
}

/// Streaming session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Interface the per-session file endpoints bind to. The port is always ephemeral.
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Minimum spacing between progress events of one job.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// How long the bridge waits for `start` before giving up and stopping the session.
    #[serde(default = "default_start_timeout_secs")]
    pub start_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            progress_interval_ms: default_progress_interval_ms(),
            start_timeout_secs: default_start_timeout_secs(),
        }
    }
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_start_timeout_secs() -> u64 {
    60
}

/// Download cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_limit")]
    pub limit_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            limit_bytes: default_cache_limit(),
        }
    }
}

fn default_cache_limit() -> u64 {
    10 * 1024 * 1024 * 1024
}

/// Torrent source provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Per-request timeout in seconds (default: 15)
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "ProviderEndpointConfig::piratebay")]
    pub piratebay: ProviderEndpointConfig,
    #[serde(default = "ProviderEndpointConfig::yts")]
    pub yts: ProviderEndpointConfig,
    #[serde(default = "ProviderEndpointConfig::eztv")]
    pub eztv: ProviderEndpointConfig,
    #[serde(default = "ProviderEndpointConfig::torrents_csv")]
    pub torrents_csv: ProviderEndpointConfig,
    #[serde(default = "ProviderEndpointConfig::knaben")]
    pub knaben: ProviderEndpointConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout(),
            user_agent: default_user_agent(),
            piratebay: ProviderEndpointConfig::piratebay(),
            yts: ProviderEndpointConfig::yts(),
            eztv: ProviderEndpointConfig::eztv(),
            torrents_csv: ProviderEndpointConfig::torrents_csv(),
            knaben: ProviderEndpointConfig::knaben(),
        }
    }
}

fn default_provider_timeout() -> u32 {
    15
}

fn default_user_agent() -> String {
    concat!("cinebridge/", env!("CARGO_PKG_VERSION")).to_string()
}

/// A single provider endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEndpointConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: String,
}

impl ProviderEndpointConfig {
    fn with_url(url: &str) -> Self {
        Self {
            enabled: true,
            base_url: url.to_string(),
        }
    }

    pub fn piratebay() -> Self {
        Self::with_url("https://apibay.org")
    }

    pub fn yts() -> Self {
        Self::with_url("https://yts.mx/api/v2")
    }

    pub fn eztv() -> Self {
        Self::with_url("https://eztvx.to/api")
    }

    pub fn torrents_csv() -> Self {
        Self::with_url("https://torrents-csv.com/service")
    }

    pub fn knaben() -> Self {
        Self::with_url("https://api.knaben.org/v1")
    }
}

/// Subtitle backends configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    /// ISO 639-1/639-2 language codes to request.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub opensubtitles: OpenSubtitlesConfig,
    #[serde(default)]
    pub stremio: StremioSubtitlesConfig,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            opensubtitles: OpenSubtitlesConfig::default(),
            stremio: StremioSubtitlesConfig::default(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

/// OpenSubtitles REST API configuration. Skipped entirely without an API key.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenSubtitlesConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Stremio OpenSubtitles addon configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StremioSubtitlesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_stremio_subtitles_url")]
    pub base_url: String,
}

impl Default for StremioSubtitlesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_stremio_subtitles_url(),
        }
    }
}

fn default_stremio_subtitles_url() -> String {
    "https://opensubtitles-v3.strem.io".to_string()
}

/// Metadata catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_cinemeta_url")]
    pub cinemeta_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cinemeta_url: default_cinemeta_url(),
        }
    }
}

fn default_cinemeta_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

/// Location of the user settings file written by the desktop shell.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub stream: StreamConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
    pub subtitles: SanitizedSubtitlesConfig,
    pub catalog: CatalogConfig,
}

/// Sanitized subtitle config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSubtitlesConfig {
    pub languages: Vec<String>,
    pub opensubtitles_configured: bool,
    pub stremio_enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            engine: config.engine.clone(),
            stream: config.stream.clone(),
            cache: config.cache.clone(),
            providers: config.providers.clone(),
            subtitles: SanitizedSubtitlesConfig {
                languages: config.subtitles.languages.clone(),
                opensubtitles_configured: !config.subtitles.opensubtitles.api_key.is_empty(),
                stremio_enabled: config.subtitles.stremio.enabled,
            },
            catalog: config.catalog.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 7878);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.stream.progress_interval_ms, 1000);
        assert_eq!(config.stream.start_timeout_secs, 60);
        assert_eq!(config.cache.limit_bytes, 10 * 1024 * 1024 * 1024);
        assert!(config.engine.enable_dht);
        assert!(config.settings.path.is_none());
    }

    #[test]
    fn test_deserialize_partial_provider_override() {
        let toml = r#"
[providers]
timeout_secs = 5

[providers.yts]
enabled = false
base_url = "http://localhost:9000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.timeout_secs, 5);
        assert!(!config.providers.yts.enabled);
        assert_eq!(config.providers.yts.base_url, "http://localhost:9000");
        // untouched providers keep their defaults
        assert!(config.providers.piratebay.enabled);
        assert_eq!(config.providers.piratebay.base_url, "https://apibay.org");
    }

    #[test]
    fn test_deserialize_engine_and_cache() {
        let toml = r#"
[engine]
download_path = "/data/torrents"
enable_dht = false
listen_port = 4240
upload_limit_bytes_per_sec = 512000

[cache]
limit_bytes = 1048576
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.download_path, PathBuf::from("/data/torrents"));
        assert!(!config.engine.enable_dht);
        assert_eq!(config.engine.listen_port, Some(4240));
        assert_eq!(config.engine.upload_limit_bytes_per_sec, 512000);
        assert_eq!(config.cache.limit_bytes, 1048576);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let mut config = Config::default();
        config.subtitles.opensubtitles.api_key = "secret-key".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.subtitles.opensubtitles_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }

    #[test]
    fn test_sanitized_config_without_api_key() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert!(!sanitized.subtitles.opensubtitles_configured);
        assert!(sanitized.subtitles.stremio_enabled);
        assert_eq!(sanitized.subtitles.languages, vec!["en".to_string()]);
    }
}
