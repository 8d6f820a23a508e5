//! URL handling module for Sumi-Index
//!
//! This module provides URL normalization, link resolution, and the
//! same-site scope rule that keeps a crawl inside its configured root.

mod normalize;
mod scope;

pub use normalize::{normalize_url, resolve_link};
pub use scope::{is_within_site, SiteScopes};
