use crate::config::types::{ApiConfig, BackfillConfig, Config, ListenerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_backfill_config(&config.backfill)?;
    validate_listener_config(&config.listener)?;

    // A zero-sized batch would never make progress
    if config.crawl.concurrency < 1 || config.top_stories.concurrency < 1 {
        return Err(ConfigError::Validation(
            "crawl and top-stories concurrency must be >= 1".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::Validation(
            "database.path cannot be empty".to_string(),
        ));
    }

    if config.startup.max_item_retries < 1 {
        return Err(ConfigError::Validation(
            "startup.max-item-retries must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates upstream API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.request_timeout_ms == 0 || config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "api timeouts must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "api.user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates backfill range and window sizes
fn validate_backfill_config(config: &BackfillConfig) -> Result<(), ConfigError> {
    if config.start_id < 0 {
        return Err(ConfigError::Validation(format!(
            "backfill.start-id must be >= 0, got {}",
            config.start_id
        )));
    }

    if config.end_id != 0 && config.end_id <= config.start_id {
        return Err(ConfigError::Validation(format!(
            "backfill.end-id ({}) must be greater than start-id ({})",
            config.end_id, config.start_id
        )));
    }

    if config.window_size < 1 || config.concurrency < 1 {
        return Err(ConfigError::Validation(
            "backfill window-size and concurrency must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates live poller settings
fn validate_listener_config(config: &ListenerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "listener.batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.poll_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "listener.poll-interval-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
