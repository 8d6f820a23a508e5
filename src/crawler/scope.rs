//! Per-site crawl scope
//!
//! Everything one site crawl shares between its tasks lives here: the site
//! record, the run's stop signal, storage, the HTTP client, a bounded pool
//! of fetch slots and the visit tracker. A scope is created when a site crawl
//! begins and shut down when it ends, so a large site never borrows fetch
//! capacity from another.

use crate::config::IndexerConfig;
use crate::crawler::signal::StopSignal;
use crate::crawler::visited::VisitTracker;
use crate::crawler::STOPPED_BY_USER;
use crate::state::SiteStatus;
use crate::storage::{SiteRecord, Storage};
use crate::url::is_within_site;
use crate::IndexerError;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Per-request settings every crawl task follows
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Referer header sent with each request
    pub referrer: String,
    /// Pause after each successful fetch
    pub request_delay: Duration,
    /// Maximum link depth below the scope root
    pub max_depth: Option<u32>,
    /// Simultaneous fetches allowed within one scope
    pub fetch_concurrency: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self {
            referrer: config.referrer.clone(),
            request_delay: config.request_delay(),
            max_depth: config.max_depth,
            fetch_concurrency: config.fetch_concurrency().max(1),
        }
    }
}

/// Shared state of one site crawl
pub struct CrawlScope {
    site: SiteRecord,
    signal: StopSignal,
    storage: Arc<dyn Storage>,
    client: Client,
    settings: CrawlSettings,
    fetch_slots: Semaphore,
    visited: VisitTracker,
    stop_recorded: AtomicBool,
}

impl CrawlScope {
    pub fn new(
        site: SiteRecord,
        signal: StopSignal,
        storage: Arc<dyn Storage>,
        client: Client,
        settings: CrawlSettings,
    ) -> Arc<Self> {
        let fetch_slots = Semaphore::new(settings.fetch_concurrency);
        Arc::new(Self {
            site,
            signal,
            storage,
            client,
            settings,
            fetch_slots,
            visited: VisitTracker::new(),
            stop_recorded: AtomicBool::new(false),
        })
    }

    pub fn site(&self) -> &SiteRecord {
        &self.site
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn visited(&self) -> &VisitTracker {
        &self.visited
    }

    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }

    /// Waits for a free fetch slot
    pub async fn acquire_fetch_slot(&self) -> Result<SemaphorePermit<'_>, IndexerError> {
        self.fetch_slots
            .acquire()
            .await
            .map_err(|_| IndexerError::ScopeClosed {
                site: self.site.url.clone(),
            })
    }

    /// Decides whether a discovered link becomes a child task
    ///
    /// The link must lie under the site root, must not already be stored, and
    /// must not have been claimed by another task of this scope.
    pub fn accepts_link(&self, url: &str) -> Result<bool, IndexerError> {
        if !is_within_site(&self.site.url, url) {
            return Ok(false);
        }

        if self.storage.page_exists(url)? {
            return Ok(false);
        }

        Ok(self.visited.claim(url))
    }

    /// Marks the site FAILED with the given message
    ///
    /// A storage failure here is logged; the task that hit the original error
    /// has nothing better to do with it.
    pub fn mark_failed(&self, message: &str) {
        if let Err(e) =
            self.storage
                .update_site_status(self.site.id, SiteStatus::Failed, Some(message))
        {
            tracing::error!(
                "Could not mark site {} as failed ({}): {}",
                self.site.url,
                message,
                e
            );
        }
    }

    /// Records a user stop against the site, once per scope
    pub fn record_stop(&self) {
        if !self.stop_recorded.swap(true, Ordering::AcqRel) {
            self.mark_failed(STOPPED_BY_USER);
        }
    }

    /// Closes the fetch slots; tasks still waiting for one fail with `ScopeClosed`
    pub fn shutdown(&self) {
        self.fetch_slots.close();
    }
}
