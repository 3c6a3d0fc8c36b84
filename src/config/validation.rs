use crate::config::types::{Config, CrawlerConfig, HttpConfig, StorageConfig};
use crate::crawler::BACKOFF_MULTIPLIER;
use crate::ConfigError;
use std::time::Duration;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.sleep_time.is_finite() || config.sleep_time < 0.0 {
        return Err(ConfigError::Validation(format!(
            "sleep_time must be a non-negative number of seconds, got {}",
            config.sleep_time
        )));
    }

    // The rate-limit backoff starts at ten times the sleep, so that must fit too
    let backoff_secs = config.sleep_time * f64::from(BACKOFF_MULTIPLIER);
    if Duration::try_from_secs_f64(backoff_secs).is_err() {
        return Err(ConfigError::Validation(format!(
            "sleep_time is too large, got {}",
            config.sleep_time
        )));
    }

    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
