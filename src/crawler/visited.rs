use crate::url::normalize_url;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// URLs already handed to a crawl task within one crawl scope
///
/// This is the cheap filter in front of task creation: two pages linking to
/// the same URL spawn one task instead of two. It is not the duplicate guard
/// for stored pages; `PageStore::insert_page_if_absent` is.
#[derive(Debug, Default)]
pub struct VisitTracker {
    claimed: Mutex<HashSet<String>>,
}

impl VisitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL for crawling; returns false if it was already claimed
    ///
    /// URLs are compared in normalized form, so `https://a.test` and
    /// `https://a.test/#top` are the same claim.
    pub fn claim(&self, url: &str) -> bool {
        let key = normalize_url(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());

        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
