//! Crawler module for site indexing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with the configured identity and timeouts
//! - HTML link extraction
//! - Recursive crawl tasks bounded by a per-site crawl scope
//! - Run coordination across sites (start, stop, single-page indexing)

mod coordinator;
mod fetcher;
mod parser;
mod scope;
mod signal;
mod site_crawl;
mod task;
mod visited;

pub use coordinator::{CoordinatorError, IndexingCoordinator, RunHandle, RunSummary};
pub use fetcher::{build_http_client, fetch_page, is_text_content, FetchOutcome, FetchedPage};
pub use parser::extract_links;
pub use scope::{CrawlScope, CrawlSettings};
pub use signal::StopSignal;
pub use site_crawl::{SiteCrawl, SiteCrawlOutcome};
pub use task::CrawlTask;
pub use visited::VisitTracker;

use crate::config::Config;
use crate::storage::{SqliteStorage, Storage};
use crate::IndexerError;
use std::path::Path;
use std::sync::Arc;

/// Error recorded against a site whose crawl was stopped on request
pub const STOPPED_BY_USER: &str = "stopped by user";

/// Runs one full indexing pass over every configured site and waits for it
///
/// This is the entry point for batch use. It will:
/// 1. Open the database named in the configuration
/// 2. Start a run over all configured sites
/// 3. Wait for every site crawl to finish
pub async fn run_once(config: &Config) -> Result<RunSummary, IndexerError> {
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(Path::new(&config.output.database_path))?);
    let coordinator = IndexingCoordinator::new(config, storage)?;

    let handle = coordinator
        .start()
        .map_err(|e| IndexerError::RunStart(e.to_string()))?;
    handle.wait().await
}
