//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the indexer, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with the configured referrer
//! - Content-Type classification (only text documents are indexed)

use crate::config::IndexerConfig;
use crate::IndexerError;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Redirect hops followed before a fetch is abandoned
const MAX_REDIRECTS: usize = 10;

/// A fetched text document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; links are resolved against it
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Page body content
    pub body: String,
}

/// Result of a successful request
#[derive(Debug)]
pub enum FetchOutcome {
    /// A `text/*` document worth indexing
    Document(FetchedPage),

    /// Anything else (images, archives, responses without a Content-Type)
    Unsupported {
        /// The Content-Type received, empty when absent
        content_type: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_index::config::IndexerConfig;
/// use sumi_index::crawler::build_http_client;
///
/// let config = IndexerConfig {
///     user_agent: "SumiIndex/1.0".to_string(),
///     referrer: "https://www.google.com".to_string(),
///     request_delay: 500,
///     request_timeout: 30,
///     max_concurrent_fetches: None,
///     site_workers: None,
///     max_depth: None,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &IndexerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the response
///
/// Transport failures and non-2xx statuses are errors; the caller turns them
/// into a site failure. A successful response is only read into memory when
/// its Content-Type is a `text/*` type.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    referrer: &str,
) -> Result<FetchOutcome, IndexerError> {
    let http_error = |source: reqwest::Error| IndexerError::Http {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url)
        .header(REFERER, referrer)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(http_error)?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_text_content(&content_type) {
        return Ok(FetchOutcome::Unsupported { content_type });
    }

    let body = response.text().await.map_err(http_error)?;

    Ok(FetchOutcome::Document(FetchedPage {
        final_url,
        status_code,
        content_type,
        body,
    }))
}

/// Checks whether a Content-Type names a text-family type
pub fn is_text_content(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("text/")
}
