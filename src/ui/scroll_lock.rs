//! Scroll lock for the page underneath an overlay.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared lock that freezes page scrolling while held.
///
/// Every holder owns a [`ScrollLockGuard`]; the page stays locked until the
/// last guard is dropped.
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> ScrollLockGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("Scroll lock acquired");
        ScrollLockGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

/// Releases its share of the [`ScrollLock`] on drop.
#[derive(Debug)]
#[must_use = "the scroll lock is released as soon as the guard is dropped"]
pub struct ScrollLockGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!("Scroll lock released");
    }
}
