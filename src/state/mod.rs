//! State module for tracking indexing progress
//!
//! - `SiteStatus`: the per-site status machine (INDEXING, INDEXED, FAILED)

mod site_status;

pub use site_status::SiteStatus;
