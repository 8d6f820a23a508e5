use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Index
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Referer header sent with every request
    pub referrer: String,

    /// Pause after each successful fetch (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum simultaneous fetches within one site crawl
    #[serde(rename = "max-concurrent-fetches", default)]
    pub max_concurrent_fetches: Option<u32>,

    /// Number of sites crawled at the same time
    #[serde(rename = "site-workers", default)]
    pub site_workers: Option<u32>,

    /// Maximum link depth below a site root; unbounded when absent
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}

impl IndexerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Fetch slots per site crawl, defaulting to the available parallelism
    pub fn fetch_concurrency(&self) -> usize {
        self.max_concurrent_fetches
            .map(|n| n as usize)
            .unwrap_or_else(available_parallelism)
    }

    /// Size of the site worker pool, defaulting to the available parallelism
    pub fn worker_count(&self) -> usize {
        self.site_workers
            .map(|n| n as usize)
            .unwrap_or_else(available_parallelism)
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_request_delay() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

/// HTTP surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One site to index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteEntry {
    /// Root URL; every followed link must lie under it
    pub url: String,

    /// Display name
    pub name: String,
}
