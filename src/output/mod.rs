//! Output module for reporting index contents
//!
//! This module handles:
//! - Per-site summaries of status and page counts
//! - Printing those summaries for the `stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, IndexStatistics, SiteSummary};
