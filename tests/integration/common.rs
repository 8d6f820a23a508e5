//! Shared fixtures for the integration tests

use std::sync::Arc;
use std::time::Duration;
use sumi_index::config::{Config, IndexerConfig, OutputConfig, ServerConfig, SiteEntry};
use sumi_index::storage::{SqliteStorage, Storage};
use wiremock::{MockServer, ResponseTemplate};

/// Creates a test configuration for the given sites
pub fn test_config(sites: Vec<SiteEntry>, db_path: &str) -> Config {
    Config {
        indexer: IndexerConfig {
            user_agent: "TestIndexer/1.0".to_string(),
            referrer: "https://www.google.com".to_string(),
            request_delay: 0,
            request_timeout: 5,
            max_concurrent_fetches: Some(4),
            site_workers: Some(2),
            max_depth: None,
        },
        server: ServerConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        sites,
    }
}

pub fn site(url: &str, name: &str) -> SiteEntry {
    SiteEntry {
        url: url.to_string(),
        name: name.to_string(),
    }
}

pub fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(SqliteStorage::new_in_memory().expect("in-memory database"))
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

pub fn png() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
}

/// Returns a URL on a local port with nothing listening
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Waits until the mock server has seen at least one request
pub async fn wait_for_request(server: &MockServer) {
    for _ in 0..200 {
        let seen = server
            .received_requests()
            .await
            .map(|requests| !requests.is_empty())
            .unwrap_or(false);
        if seen {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("mock server never received a request");
}

/// Sorted page paths stored for a site URL
pub fn stored_paths(storage: &dyn Storage, site_url: &str) -> Vec<String> {
    let site = storage
        .find_site_by_url(site_url)
        .expect("query site")
        .expect("site exists");
    let mut paths: Vec<String> = storage
        .pages_for_site(site.id)
        .expect("query pages")
        .into_iter()
        .map(|page| page.path)
        .collect();
    paths.sort();
    paths
}
