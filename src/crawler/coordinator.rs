//! Indexing coordinator
//!
//! The coordinator owns the run lifecycle: it starts a crawl of every
//! configured site on a bounded pool of site workers, stops a running crawl,
//! and re-indexes single pages on request. At most one full run is active at
//! a time, and a stopped run stays active until its last site crawl has
//! drained. Every run and every single-page crawl gets its own stop signal.

use crate::config::{Config, SiteEntry};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::scope::{CrawlScope, CrawlSettings};
use crate::crawler::signal::StopSignal;
use crate::crawler::site_crawl::{SiteCrawl, SiteCrawlOutcome};
use crate::crawler::task::CrawlTask;
use crate::crawler::STOPPED_BY_USER;
use crate::state::SiteStatus;
use crate::storage::{reset_site, SiteRecord, Storage, StorageError};
use crate::url::{normalize_url, SiteScopes};
use crate::IndexerError;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

/// Errors reported to callers of the coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("crawl already in progress")]
    AlreadyRunning,

    #[error("crawl is not running")]
    NotRunning,

    #[error("This page is outside the sites listed in the configuration file: {0}")]
    OutOfScope(String),

    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Indexing(#[from] IndexerError),
}

impl From<StorageError> for CoordinatorError {
    fn from(e: StorageError) -> Self {
        Self::Indexing(e.into())
    }
}

/// Per-site tallies of a finished run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub indexed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &SiteCrawlOutcome) {
        match outcome {
            SiteCrawlOutcome::Indexed => self.indexed += 1,
            SiteCrawlOutcome::Failed(_) => self.failed += 1,
            SiteCrawlOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Handle to a started run
///
/// Dropping the handle detaches from the run; it keeps going.
pub struct RunHandle {
    id: u64,
    supervisor: JoinHandle<RunSummary>,
}

impl RunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for every site crawl of the run to finish
    pub async fn wait(self) -> Result<RunSummary, IndexerError> {
        self.supervisor
            .await
            .map_err(|e| IndexerError::TaskPanicked(e.to_string()))
    }
}

struct ActiveRun {
    id: u64,
    signal: StopSignal,
}

type PageCrawls = Mutex<HashMap<u64, StopSignal>>;

/// Keeps a single-page crawl reachable by `stop` while it runs
struct PageCrawlGuard<'a> {
    crawls: &'a PageCrawls,
    id: u64,
}

impl Drop for PageCrawlGuard<'_> {
    fn drop(&mut self) {
        self.crawls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Starts, stops and supervises indexing runs
pub struct IndexingCoordinator {
    sites: SiteScopes,
    storage: Arc<dyn Storage>,
    client: Client,
    settings: CrawlSettings,
    workers: Arc<Semaphore>,
    active: Arc<Mutex<Option<ActiveRun>>>,
    page_crawls: PageCrawls,
    next_run_id: AtomicU64,
}

impl IndexingCoordinator {
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, IndexerError> {
        let client = build_http_client(&config.indexer)?;
        let worker_count = config.indexer.worker_count().max(1);

        tracing::debug!(
            "Coordinator ready: {} sites, {} site workers",
            config.sites.len(),
            worker_count
        );

        Ok(Self {
            sites: SiteScopes::from_config(&config.sites),
            storage,
            client,
            settings: CrawlSettings::from_config(&config.indexer),
            workers: Arc::new(Semaphore::new(worker_count)),
            active: Arc::new(Mutex::new(None)),
            page_crawls: Mutex::new(HashMap::new()),
            next_run_id: AtomicU64::new(1),
        })
    }

    pub fn sites(&self) -> &[SiteEntry] {
        self.sites.sites()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_page_crawls(&self) -> MutexGuard<'_, HashMap<u64, StopSignal>> {
        self.page_crawls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a run or a single-page crawl is going and has not been asked to stop
    pub fn is_running(&self) -> bool {
        let run_going = self
            .lock_active()
            .as_ref()
            .is_some_and(|run| run.signal.is_running());
        run_going
            || self
                .lock_page_crawls()
                .values()
                .any(StopSignal::is_running)
    }

    /// Starts a full run over every configured site
    ///
    /// Returns immediately; the run proceeds in the background. Fails while
    /// an earlier run is active, including one that was stopped but still has
    /// site crawls winding down. Single-page crawls do not block a run. Must
    /// be called from within a tokio runtime.
    pub fn start(&self) -> Result<RunHandle, CoordinatorError> {
        let mut active = self.lock_active();
        if active.is_some() {
            return Err(CoordinatorError::AlreadyRunning);
        }

        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let signal = StopSignal::new();
        *active = Some(ActiveRun {
            id,
            signal: signal.clone(),
        });

        tracing::info!("Starting indexing run {} over {} sites", id, self.sites.len());

        let mut jobs = JoinSet::new();
        for entry in self.sites.sites() {
            let crawl = SiteCrawl::new(
                entry.clone(),
                signal.clone(),
                Arc::clone(&self.storage),
                self.client.clone(),
                self.settings.clone(),
            );
            let workers = Arc::clone(&self.workers);

            jobs.spawn(async move {
                match workers.acquire_owned().await {
                    Ok(_permit) => crawl.run().await,
                    Err(_) => SiteCrawlOutcome::Skipped,
                }
            });
        }

        let active_slot = Arc::clone(&self.active);
        let supervisor = tokio::spawn(async move {
            let mut summary = RunSummary::default();
            while let Some(joined) = jobs.join_next().await {
                match joined {
                    Ok(outcome) => summary.record(&outcome),
                    Err(e) => {
                        tracing::error!("Site crawl panicked: {}", e);
                        summary.failed += 1;
                    }
                }
            }

            let mut slot = active_slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|run| run.id == id) {
                *slot = None;
            }
            drop(slot);

            tracing::info!(
                "Indexing run {} finished: {} indexed, {} failed, {} skipped",
                id,
                summary.indexed,
                summary.failed,
                summary.skipped
            );
            summary
        });

        Ok(RunHandle { id, supervisor })
    }

    /// Asks the active run and every single-page crawl to stop
    ///
    /// Fetches already in flight complete; nothing new is started. Fails if
    /// nothing was running.
    pub fn stop(&self) -> Result<(), CoordinatorError> {
        let mut stopped = false;

        if let Some(run) = self.lock_active().as_ref() {
            if run.signal.stop() {
                tracing::info!("Stopping indexing run {}", run.id);
                stopped = true;
            }
        }

        for (id, signal) in self.lock_page_crawls().iter() {
            if signal.stop() {
                tracing::info!("Stopping page crawl {}", id);
                stopped = true;
            }
        }

        if stopped {
            Ok(())
        } else {
            Err(CoordinatorError::NotRunning)
        }
    }

    fn register_page_crawl(&self) -> (PageCrawlGuard<'_>, StopSignal) {
        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let signal = StopSignal::new();
        self.lock_page_crawls().insert(id, signal.clone());
        (
            PageCrawlGuard {
                crawls: &self.page_crawls,
                id,
            },
            signal,
        )
    }

    /// Indexes or re-indexes a single page and whatever new pages it links to
    ///
    /// The URL must lie under one of the configured sites. An already stored
    /// page is deleted and fetched again under its existing site record;
    /// otherwise the page gets a fresh site record of its own, replacing any
    /// earlier record for the same URL. The crawl can be stopped with `stop`.
    pub async fn index_page(&self, url: &str) -> Result<(), CoordinatorError> {
        let url = url.trim();
        normalize_url(url).map_err(|e| CoordinatorError::InvalidUrl(format!("{}: {}", url, e)))?;

        let Some(entry) = self.sites.find_site(url) else {
            tracing::warn!("Refusing to index {}: outside configured sites", url);
            return Err(CoordinatorError::OutOfScope(url.to_string()));
        };

        let storage = self.storage.as_ref();
        let (_registration, signal) = self.register_page_crawl();

        if let Some(page) = storage.find_page_by_path(url)? {
            let site = storage.get_site(page.site_id)?;
            storage.delete_page(page.id)?;
            tracing::info!("Re-indexing {} under site {}", url, site.url);
            return self.crawl_from(site, url, signal).await;
        }

        if let Some(removed) = reset_site(storage, url)? {
            tracing::info!("Cleared previous record of {} ({} pages)", url, removed);
        }
        let site = storage.insert_site(url, &entry.name, SiteStatus::Indexing)?;
        let site_id = site.id;
        tracing::info!("Indexing new page {} for {}", url, entry.name);

        self.crawl_from(site, url, signal.clone()).await?;

        let site = storage.get_site(site_id)?;
        if !site.status.is_terminal() {
            if signal.is_running() {
                storage.update_site_status(site_id, SiteStatus::Indexed, None)?;
            } else {
                storage.update_site_status(site_id, SiteStatus::Failed, Some(STOPPED_BY_USER))?;
            }
        }
        Ok(())
    }

    async fn crawl_from(
        &self,
        site: SiteRecord,
        url: &str,
        signal: StopSignal,
    ) -> Result<(), CoordinatorError> {
        let scope = CrawlScope::new(
            site,
            signal,
            Arc::clone(&self.storage),
            self.client.clone(),
            self.settings.clone(),
        );

        let result = CrawlTask::root(url, Arc::clone(&scope)).run().await;
        scope.shutdown();
        result.map_err(CoordinatorError::from)
    }
}
