//! Recursive crawl task
//!
//! A task fetches one URL, stores it, and spawns a child task for every new
//! in-scope link it finds. A task completes only after all of its children
//! have completed, so awaiting the root task awaits the whole crawl tree.

use crate::crawler::fetcher::{fetch_page, FetchOutcome};
use crate::crawler::parser::extract_links;
use crate::crawler::scope::CrawlScope;
use crate::storage::NewPage;
use crate::IndexerError;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// One unit of crawl work: fetch, store, and recurse into new links
pub struct CrawlTask {
    url: String,
    depth: u32,
    scope: Arc<CrawlScope>,
}

impl CrawlTask {
    /// Creates the task at the top of a crawl tree and claims its URL
    pub fn root(url: impl Into<String>, scope: Arc<CrawlScope>) -> Self {
        let url = url.into();
        scope.visited().claim(&url);
        Self {
            url,
            depth: 0,
            scope,
        }
    }

    fn child(&self, url: String) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            scope: Arc::clone(&self.scope),
        }
    }

    /// Runs the task and every task it spawns
    ///
    /// Fetch failures are recorded against the site and end this branch with
    /// `Ok`. Errors returned here are unexpected ones (storage, a closed
    /// scope, a panicked child) and reach the site crawl that owns the tree.
    pub fn run(self) -> BoxFuture<'static, Result<(), IndexerError>> {
        self.compute().boxed()
    }

    async fn compute(self) -> Result<(), IndexerError> {
        let scope = Arc::clone(&self.scope);
        let site = scope.site();

        if !scope.is_running() {
            tracing::debug!("Stopped before fetching {}", self.url);
            scope.record_stop();
            return Ok(());
        }

        let page = {
            let _slot = scope.acquire_fetch_slot().await?;

            if !scope.is_running() {
                tracing::debug!("Stopped before fetching {}", self.url);
                scope.record_stop();
                return Ok(());
            }

            tracing::debug!("Fetching {} (depth {})", self.url, self.depth);
            let outcome =
                fetch_page(scope.client(), &self.url, &scope.settings().referrer).await;

            let page = match outcome {
                Ok(FetchOutcome::Document(page)) => page,
                Ok(FetchOutcome::Unsupported { content_type }) => {
                    tracing::warn!(
                        "Skipping {}: unsupported content type '{}'",
                        self.url,
                        content_type
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("Error indexing {}: {}", self.url, e);
                    scope.mark_failed(&e.to_string());
                    return Ok(());
                }
            };

            let delay = scope.settings().request_delay;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            page
        };

        let base_url = Url::parse(&page.final_url)?;
        let new_page = NewPage {
            site_id: site.id,
            path: self.url.clone(),
            code: page.status_code,
            content: page.body,
        };

        if scope.storage().insert_page_if_absent(&new_page)? {
            tracing::info!("Indexed {} ({})", self.url, new_page.code);
        } else {
            tracing::warn!("Page {} is already indexed", self.url);
        }

        if let Some(max_depth) = scope.settings().max_depth {
            if self.depth >= max_depth {
                tracing::debug!("Not following links of {}: depth limit", self.url);
                return Ok(());
            }
        }

        let mut children = Vec::new();
        for link in extract_links(&new_page.content, &base_url) {
            if scope.accepts_link(&link)? {
                children.push(self.child(link));
            }
        }

        if children.is_empty() {
            return Ok(());
        }

        if !scope.is_running() {
            tracing::debug!("Stopped before following links of {}", self.url);
            scope.record_stop();
            return Ok(());
        }

        let mut join_set = JoinSet::new();
        for child in children {
            tracing::debug!("Added task for {}", child.url);
            join_set.spawn(child.run());
        }

        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            let result = joined
                .map_err(|e| IndexerError::TaskPanicked(e.to_string()))
                .and_then(|r| r);

            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
