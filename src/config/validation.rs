use crate::config::types::{Config, IndexerConfig, OutputConfig, ServerConfig, SiteEntry};
use crate::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

/// Upper bound for the per-site fetch slots and the site worker pool
const MAX_WORKERS: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_indexer_config(&config.indexer)?;
    validate_server_config(&config.server)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawl behavior configuration
fn validate_indexer_config(config: &IndexerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.referrer.trim().is_empty() {
        return Err(ConfigError::Validation(
            "referrer cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.referrer)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referrer: {}", e)))?;

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    validate_worker_bound("max-concurrent-fetches", config.max_concurrent_fetches)?;
    validate_worker_bound("site-workers", config.site_workers)?;

    Ok(())
}

fn validate_worker_bound(key: &str, value: Option<u32>) -> Result<(), ConfigError> {
    match value {
        Some(n) if !(1..=MAX_WORKERS).contains(&n) => Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_WORKERS, n
        ))),
        _ => Ok(()),
    }
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid bind-address '{}': {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site list: well-formed roots, names, and no duplicates
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for site in sites {
        let url = Url::parse(&site.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' must use HTTP or HTTPS",
                site.url
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Site URL '{}' has no host",
                site.url
            )));
        }

        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                site.url
            )));
        }

        if !seen.insert(site.url.trim_end_matches('/').to_string()) {
            return Err(ConfigError::Validation(format!(
                "Site URL '{}' is listed more than once",
                site.url
            )));
        }
    }

    Ok(())
}
