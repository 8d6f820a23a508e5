//! Full crawl of one configured site

use crate::config::SiteEntry;
use crate::crawler::scope::{CrawlScope, CrawlSettings};
use crate::crawler::signal::StopSignal;
use crate::crawler::task::CrawlTask;
use crate::crawler::STOPPED_BY_USER;
use crate::state::SiteStatus;
use crate::storage::{reset_site, Storage, StorageError};
use crate::IndexerError;
use reqwest::Client;
use std::sync::Arc;

/// How a site crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteCrawlOutcome {
    /// The run was already stopped; nothing was touched
    Skipped,
    /// The whole tree finished and the site is INDEXED
    Indexed,
    /// The site ended FAILED with this message
    Failed(String),
}

/// Re-indexes one configured site from scratch
///
/// The previous record for the site and all of its pages are removed, a
/// fresh record is created in INDEXING, and the crawl tree rooted at the
/// site URL runs to completion inside its own crawl scope.
pub struct SiteCrawl {
    entry: SiteEntry,
    signal: StopSignal,
    storage: Arc<dyn Storage>,
    client: Client,
    settings: CrawlSettings,
}

impl SiteCrawl {
    pub fn new(
        entry: SiteEntry,
        signal: StopSignal,
        storage: Arc<dyn Storage>,
        client: Client,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            entry,
            signal,
            storage,
            client,
            settings,
        }
    }

    pub async fn run(self) -> SiteCrawlOutcome {
        if !self.signal.is_running() {
            tracing::info!("Skipping {}: indexing was stopped", self.entry.url);
            return SiteCrawlOutcome::Skipped;
        }

        let mut site_id = None;
        match self.crawl(&mut site_id).await {
            Ok(outcome) => outcome,
            Err(e) => self.record_error(site_id, &e),
        }
    }

    /// Runs the crawl, leaving the id of the record it created in `site_id`
    async fn crawl(&self, site_id: &mut Option<i64>) -> Result<SiteCrawlOutcome, IndexerError> {
        let storage = self.storage.as_ref();

        if let Some(removed) = reset_site(storage, &self.entry.url)? {
            tracing::info!(
                "Cleared previous index of {} ({} pages)",
                self.entry.url,
                removed
            );
        }

        let site = storage.insert_site(&self.entry.url, &self.entry.name, SiteStatus::Indexing)?;
        let id = site.id;
        *site_id = Some(id);
        tracing::info!("Indexing site {} ({})", self.entry.name, self.entry.url);

        let scope = CrawlScope::new(
            site,
            self.signal.clone(),
            Arc::clone(&self.storage),
            self.client.clone(),
            self.settings.clone(),
        );

        let result = CrawlTask::root(self.entry.url.clone(), Arc::clone(&scope))
            .run()
            .await;
        scope.shutdown();
        result?;

        let site = storage.get_site(id)?;
        if site.status == SiteStatus::Failed {
            let message = site.last_error.unwrap_or_default();
            tracing::warn!("Site {} finished with errors: {}", self.entry.url, message);
            return Ok(SiteCrawlOutcome::Failed(message));
        }

        if self.signal.is_running() {
            storage.update_site_status(id, SiteStatus::Indexed, None)?;
            tracing::info!(
                "Finished indexing {} ({} pages)",
                self.entry.url,
                storage.count_pages_for_site(id)?
            );
            Ok(SiteCrawlOutcome::Indexed)
        } else {
            storage.update_site_status(id, SiteStatus::Failed, Some(STOPPED_BY_USER))?;
            Ok(SiteCrawlOutcome::Failed(STOPPED_BY_USER.to_string()))
        }
    }

    /// Marks the record this crawl created as FAILED
    ///
    /// Only that record is touched. A later crawl of the same URL owns its
    /// own record, so a missing id here is logged and left alone.
    fn record_error(&self, site_id: Option<i64>, error: &IndexerError) -> SiteCrawlOutcome {
        tracing::error!("Indexing {} failed: {}", self.entry.url, error);
        let message = format!("Error: {}", error);

        let Some(site_id) = site_id else {
            tracing::warn!("No site record for {} to mark as failed", self.entry.url);
            return SiteCrawlOutcome::Failed(message);
        };

        match self.storage.get_site(site_id) {
            Ok(site) => {
                if let Err(e) =
                    self.storage
                        .update_site_status(site.id, SiteStatus::Failed, Some(&message))
                {
                    tracing::error!("Could not record failure of {}: {}", self.entry.url, e);
                }
            }
            Err(StorageError::SiteNotFound(_)) => {
                tracing::warn!(
                    "Site record {} for {} disappeared before its failure was recorded",
                    site_id,
                    self.entry.url
                );
            }
            Err(e) => {
                tracing::error!("Could not record failure of {}: {}", self.entry.url, e);
            }
        }

        SiteCrawlOutcome::Failed(message)
    }
}
