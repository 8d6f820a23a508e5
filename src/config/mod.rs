//! Configuration module for Sumi-Index
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_index::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! for site in &config.sites {
//!     println!("{} -> {}", site.name, site.url);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, IndexerConfig, OutputConfig, ServerConfig, SiteEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
