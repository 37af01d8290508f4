//! Read-only view of the user settings file owned by the desktop shell.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use super::{types::Config, ConfigError};

/// The subset of user settings this backend consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub cache_limit_bytes: u64,
    /// 0 means unlimited.
    pub upload_limit_bytes_per_sec: u64,
}

impl UserSettings {
    /// Settings implied by the static configuration alone.
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_limit_bytes: config.cache.limit_bytes,
            upload_limit_bytes_per_sec: config.engine.upload_limit_bytes_per_sec,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    cache_limit_bytes: Option<u64>,
    #[serde(default)]
    upload_limit_bytes_per_sec: Option<u64>,
}

/// Read the settings JSON, filling absent keys from `fallback`.
///
/// A missing file is not an error: the shell only writes it once the user changes something.
pub async fn load_user_settings(
    path: &Path,
    fallback: &UserSettings,
) -> Result<UserSettings, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Settings file not found, using configured defaults");
            return Ok(fallback.clone());
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "Failed to read settings {}: {}",
                path.display(),
                e
            )))
        }
    };

    let raw: RawSettings = serde_json::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("Invalid settings JSON: {}", e)))?;

    Ok(UserSettings {
        cache_limit_bytes: raw
            .cache_limit_bytes
            .filter(|limit| *limit > 0)
            .unwrap_or(fallback.cache_limit_bytes),
        upload_limit_bytes_per_sec: raw
            .upload_limit_bytes_per_sec
            .unwrap_or(fallback.upload_limit_bytes_per_sec),
    })
}
