//! Process-wide "one crawl at a time" flag shared by the trigger endpoint
//! and the scheduler.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct CrawlGuard {
    running: Arc<AtomicBool>,
}

/// Held for the lifetime of a crawl; dropping it frees the guard.
#[derive(Debug)]
pub struct CrawlPermit {
    running: Arc<AtomicBool>,
}

impl CrawlGuard {
    /// Claims the guard, or returns `None` if a crawl is already running.
    #[must_use]
    pub fn try_acquire(&self) -> Option<CrawlPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CrawlPermit {
                running: Arc::clone(&self.running),
            })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CrawlPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_permit_dropped() {
        let guard = CrawlGuard::default();
        let permit = guard.try_acquire().expect("first acquire");
        assert!(guard.is_running());
        assert!(guard.clone().try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }
}
