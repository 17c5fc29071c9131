use crate::config::types::{
    Config, CrawlJobConfig, CrawlerConfig, JobDefaults, OutputConfig, ProjectConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    if let Some(project) = &config.project {
        validate_project_config(project)?;
    }
    validate_job_defaults(&config.job)?;
    validate_lease_covers_fetch(&config.crawler, config.job.timeout)?;
    Ok(())
}

/// Checks that a claim lease outlives a single fetch
///
/// A lease no longer than the fetch timeout lets the sweep hand a page that
/// is still being fetched to another claimant.
pub fn validate_lease_covers_fetch(
    crawler: &CrawlerConfig,
    timeout_ms: u64,
) -> Result<(), ConfigError> {
    let lease_ms = crawler.lease_timeout.saturating_mul(1000);
    if lease_ms <= timeout_ms {
        return Err(ConfigError::Validation(format!(
            "lease-timeout ({}s) must be longer than the fetch timeout ({}ms)",
            crawler.lease_timeout, timeout_ms
        )));
    }
    Ok(())
}

/// Validates a job configuration before a job is created
///
/// The job row stores the config verbatim, so everything it carries must
/// already be usable: a page budget, a fetch timeout, a user agent and
/// well-formed patterns.
pub fn validate_job_config(config: &CrawlJobConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1, got {}",
            config.timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_patterns(&config.include_patterns)?;
    validate_patterns(&config.exclude_patterns)?;

    Ok(())
}

/// Validates the base URL a crawl starts from
pub fn validate_base_url(base_url: &str) -> Result<Url, ConfigError> {
    crate::url::normalize_url(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", base_url, e)))
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.lease_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "lease-timeout must be >= 1s, got {}s",
            config.lease_timeout
        )));
    }

    if config.poll_interval < 10 {
        return Err(ConfigError::Validation(format!(
            "poll-interval must be >= 10ms, got {}ms",
            config.poll_interval
        )));
    }

    // Leases are renewed on each poll tick
    if config.poll_interval >= config.lease_timeout.saturating_mul(1000) {
        return Err(ConfigError::Validation(format!(
            "poll-interval ({}ms) must be shorter than lease-timeout ({}s)",
            config.poll_interval, config.lease_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_project_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "project id cannot be empty".to_string(),
        ));
    }

    validate_base_url(&config.base_url)?;
    Ok(())
}

fn validate_job_defaults(defaults: &JobDefaults) -> Result<(), ConfigError> {
    if defaults.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            defaults.max_pages
        )));
    }

    if defaults.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1ms, got {}ms",
            defaults.timeout
        )));
    }

    validate_patterns(&defaults.include_patterns)?;
    validate_patterns(&defaults.exclude_patterns)?;
    Ok(())
}

/// Validates include/exclude glob patterns
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidPattern(
                "URL pattern cannot be empty".to_string(),
            ));
        }

        if pattern.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidPattern(format!(
                "URL pattern '{}' cannot contain whitespace",
                pattern
            )));
        }
    }

    Ok(())
}
