use crate::config::types::{Config, CrawlerConfig, FetcherConfig, LandingZoneConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_landing_zone(&config.landing_zone)?;

    if config
        .transform
        .accepted_languages
        .iter()
        .any(|lang| lang.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "accepted_languages cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            config.workers
        )));
    }

    if config.roots.is_empty() {
        return Err(ConfigError::Validation(
            "at least one root URL is required".to_string(),
        ));
    }

    for root in &config.roots {
        validate_root_url(root)?;
    }

    if config.blocklist.iter().any(|entry| entry.is_empty()) {
        return Err(ConfigError::Validation(
            "blocklist cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    if let Some(status) = config
        .retry_statuses
        .iter()
        .find(|status| !(100..=599).contains(*status))
    {
        return Err(ConfigError::Validation(format!(
            "retry_statuses contains invalid HTTP status {}",
            status
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the landing zone layout
fn validate_landing_zone(config: &LandingZoneConfig) -> Result<(), ConfigError> {
    let required = [
        ("path", config.path.as_str()),
        ("metadata_dir", config.metadata_dir.as_str()),
        ("documents_dir", config.documents_dir.as_str()),
        ("html_dir", config.html_dir.as_str()),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    let optional = [
        ("content_dir", config.content_dir.as_deref()),
        ("report_dir", config.report_dir.as_deref()),
    ];

    for (name, value) in optional {
        if matches!(value, Some(dir) if dir.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot be empty when set",
                name
            )));
        }
    }

    if config.lock_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "lock_timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a root URL: must parse and use http or https
fn validate_root_url(root: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Root URL '{}' must use http or https",
            root
        )));
    }

    Ok(())
}
