//! Storage traits and error types
//!
//! This module defines the trait interface the crawl engine requires of a
//! storage backend, split into the site and page halves.

use crate::state::SiteStatus;
use crate::storage::{NewPage, PageRecord, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: SiteStatus, to: SiteStatus },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of sites
///
/// Implementations must be safe to share between concurrent crawl tasks.
pub trait SiteStore: Send + Sync {
    /// Finds the live site record for a root URL
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Inserts a new site record and returns it
    fn insert_site(&self, url: &str, name: &str, status: SiteStatus)
        -> StorageResult<SiteRecord>;

    /// Sets the status and last error of a site, stamping the status time
    ///
    /// Rejects moves the site status machine does not allow.
    fn update_site_status(
        &self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Deletes a site record; its pages must already be gone
    fn delete_site(&self, site_id: i64) -> StorageResult<()>;

    /// Lists every site record
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;
}

/// Durable record of pages per site
pub trait PageStore: Send + Sync {
    /// Checks whether any page with this path exists
    fn page_exists(&self, path: &str) -> StorageResult<bool>;

    /// Gets a page by path
    fn find_page_by_path(&self, path: &str) -> StorageResult<Option<PageRecord>>;

    /// Inserts a page unless one with the same (site, path) already exists
    ///
    /// The existence check and the insert happen atomically, so concurrent
    /// callers racing on one path produce exactly one row. Returns true when
    /// this call inserted the page.
    fn insert_page_if_absent(&self, page: &NewPage) -> StorageResult<bool>;

    /// Deletes one page
    fn delete_page(&self, page_id: i64) -> StorageResult<()>;

    /// Deletes every page of a site, returning how many were removed
    fn delete_pages_by_site(&self, site_id: i64) -> StorageResult<usize>;

    /// Gets all pages of a site, ordered by insertion
    fn pages_for_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Counts the pages of a site
    fn count_pages_for_site(&self, site_id: i64) -> StorageResult<u64>;
}

/// A complete storage backend
pub trait Storage: SiteStore + PageStore {}

impl<T: SiteStore + PageStore> Storage for T {}
