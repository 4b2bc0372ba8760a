use crate::config::types::{CatalogConfig, Config, OutputConfig, ScannerConfig, ScheduleConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_scanner_config(&config.scanner)?;
    validate_schedule_config(&config.schedule)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates catalog connection settings
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool and retry settings
fn validate_scanner_config(config: &ScannerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates the daily schedule
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.hour > 23 {
        return Err(ConfigError::Validation(format!(
            "schedule hour must be between 0 and 23, got {}",
            config.hour
        )));
    }

    if config.end_id < config.start_id {
        return Err(ConfigError::Validation(format!(
            "schedule end_id ({}) must be >= start_id ({})",
            config.end_id, config.start_id
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
