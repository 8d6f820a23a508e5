//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, SiteStore, StorageError, StorageResult};
use crate::storage::{NewPage, PageRecord, SiteRecord};
use crate::IndexerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

/// SQLite storage backend
///
/// The connection sits behind a mutex so one backend can be shared by every
/// crawl task; the lock is only ever held for the duration of one statement
/// or transaction.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(IndexerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, IndexerError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, IndexerError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let raw_status: String = row.get(3)?;
    let status = SiteStatus::from_db_string(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown site status '{}'", raw_status).into(),
        )
    })?;

    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status,
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

impl SiteStore for SqliteStorage {
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let conn = self.conn()?;
        let site = conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
            params![site_id],
            site_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::SiteNotFound(format!("Site ID {}", site_id)))
    }

    fn insert_site(
        &self,
        url: &str,
        name: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteRecord> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, status.to_db_string(), now],
        )?;

        Ok(SiteRecord {
            id: conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            status,
            status_time: now,
            last_error: None,
        })
    }

    fn update_site_status(
        &self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM sites WHERE id = ?1",
                params![site_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Err(StorageError::SiteNotFound(format!("Site ID {}", site_id)));
        };
        let current = SiteStatus::from_db_string(&current).ok_or_else(|| {
            StorageError::Database(format!("unknown site status '{}'", current))
        })?;

        if !current.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        tx.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![
                status.to_db_string(),
                Utc::now().to_rfc3339(),
                last_error,
                site_id
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_site(&self, site_id: i64) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
        Ok(())
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }
}

impl PageStore for SqliteStorage {
    fn page_exists(&self, path: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE path = ?1)",
            params![path],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn find_page_by_path(&self, path: &str) -> StorageResult<Option<PageRecord>> {
        let conn = self.conn()?;
        let page = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE path = ?1 ORDER BY id LIMIT 1",
                    PAGE_COLUMNS
                ),
                params![path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn insert_page_if_absent(&self, page: &NewPage) -> StorageResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE site_id = ?1 AND path = ?2)",
            params![page.site_id, page.path],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(false);
        }

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![page.site_id, page.path, page.code, page.content],
        )?;
        tx.commit()?;

        Ok(inserted == 1)
    }

    fn delete_page(&self, page_id: i64) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        Ok(())
    }

    fn delete_pages_by_site(&self, site_id: i64) -> StorageResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;
        Ok(removed)
    }

    fn pages_for_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages WHERE site_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn count_pages_for_site(&self, site_id: i64) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
