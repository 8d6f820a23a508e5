//! Integration tests for Sumi-Index
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! crawler, coordinator and HTTP surface end-to-end.

mod common;
mod crawl_tests;
mod server_tests;
