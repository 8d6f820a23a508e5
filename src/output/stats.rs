//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! per-site indexing statistics from the storage layer.

use crate::state::SiteStatus;
use crate::storage::Storage;
use crate::IndexerError;

/// Status and size of one indexed site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: Option<String>,
    pub pages: u64,
}

/// Index statistics summary
#[derive(Debug, Clone, Default)]
pub struct IndexStatistics {
    /// Every site record, in storage order
    pub sites: Vec<SiteSummary>,

    /// Pages stored across all sites
    pub total_pages: u64,
}

impl IndexStatistics {
    /// Counts the sites currently in the given status
    pub fn count_with_status(&self, status: SiteStatus) -> usize {
        self.sites.iter().filter(|s| s.status == status).count()
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<IndexStatistics, IndexerError> {
    let mut sites = Vec::new();
    let mut total_pages = 0;

    for site in storage.list_sites()? {
        let pages = storage.count_pages_for_site(site.id)?;
        total_pages += pages;
        sites.push(SiteSummary {
            url: site.url,
            name: site.name,
            status: site.status,
            status_time: site.status_time,
            last_error: site.last_error,
            pages,
        });
    }

    Ok(IndexStatistics { sites, total_pages })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.sites.len());
    println!("  Total pages: {}", stats.total_pages);
    for status in [SiteStatus::Indexing, SiteStatus::Indexed, SiteStatus::Failed] {
        println!("  {}: {}", status, stats.count_with_status(status));
    }
    println!();

    if stats.sites.is_empty() {
        println!("No sites have been indexed yet.");
        return;
    }

    println!("Sites:");
    for site in &stats.sites {
        println!("  {} ({})", site.name, site.url);
        println!(
            "    {} at {}, {} pages",
            site.status, site.status_time, site.pages
        );
        if let Some(error) = &site.last_error {
            println!("    Last error: {}", error);
        }
    }
    println!();
}
