//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the indexer, including:
//! - SQLite database initialization and schema management
//! - Site records and their status
//! - Page records and the per-site duplicate guard

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PageStore, SiteStore, Storage, StorageError, StorageResult};

use crate::state::SiteStatus;

/// Represents a site in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: Option<String>,
}

/// Represents a fetched page in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// A page about to be inserted
#[derive(Debug, Clone)]
pub struct NewPage {
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Removes the live record for a site root together with its pages
///
/// Pages go first so the site row is never left referenced. Returns the
/// number of pages removed, or None when no record existed.
pub fn reset_site(storage: &dyn Storage, url: &str) -> StorageResult<Option<usize>> {
    let Some(site) = storage.find_site_by_url(url)? else {
        return Ok(None);
    };

    let removed = storage.delete_pages_by_site(site.id)?;
    storage.delete_site(site.id)?;

    tracing::debug!("Removed site {} and {} pages", url, removed);
    Ok(Some(removed))
}
