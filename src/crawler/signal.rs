//! Cooperative stop signal shared by every task of one crawl run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run flag checked by crawl tasks before fetching and before recursing
///
/// Clones share one flag. Stopping never interrupts a fetch already in
/// flight; tasks observe the flag at their next check and wind down.
#[derive(Debug, Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
}

impl StopSignal {
    /// Creates a signal in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was still running
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
