use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.stream.progress_interval_ms < 100 {
        return Err(ConfigError::ValidationError(
            "stream.progress_interval_ms must be at least 100".to_string(),
        ));
    }

    if config.stream.start_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "stream.start_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.cache.limit_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "cache.limit_bytes cannot be 0".to_string(),
        ));
    }

    if config.engine.download_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.download_path cannot be empty".to_string(),
        ));
    }

    if config.providers.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "providers.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
