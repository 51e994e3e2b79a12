use crate::config::types::{Config, CrawlConfig, PortalConfig, StorageConfig, TransportConfig};
use crate::portal::PortalProfile;
use crate::ConfigError;
use url::Url;

/// Upper bound for `course-ttl-hours` (ten years)
pub const MAX_COURSE_TTL_HOURS: u64 = 24 * 365 * 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_storage_config(&config.storage)?;
    validate_transport_config(&config.transport)?;
    validate_crawl_config(&config.crawl)?;
    Ok(())
}

/// Validates the portal section
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    if config.institution.trim().is_empty() {
        return Err(ConfigError::Validation(
            "institution cannot be empty".to_string(),
        ));
    }

    if PortalProfile::for_institution(&config.institution).is_none() {
        return Err(ConfigError::Validation(format!(
            "institution '{}' is not supported",
            config.institution
        )));
    }

    if let Some(base_url) = &config.base_url {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' must use http or https",
                base_url
            )));
        }
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.data_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.course_ttl_hours == 0 {
        return Err(ConfigError::Validation(
            "course-ttl-hours must be >= 1".to_string(),
        ));
    }

    if config.course_ttl_hours > MAX_COURSE_TTL_HOURS {
        return Err(ConfigError::Validation(format!(
            "course-ttl-hours must be <= {}",
            MAX_COURSE_TTL_HOURS
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs == 0 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be between 1 and timeout-secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    // list page + two detail hops is the deepest traversal
    if config.history_limit < 3 {
        return Err(ConfigError::Validation(format!(
            "history-limit must be >= 3, got {}",
            config.history_limit
        )));
    }

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.command_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "command-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(bad) = config.departments.iter().find(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "departments cannot contain empty values, got '{}'",
            bad
        )));
    }

    Ok(())
}
