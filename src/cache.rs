//! Rendered-page cache and the invalidation hook writes report to.
//!
//! The gateway calls [`CacheInvalidator::invalidate`] after every successful
//! write. [`PageCache`] keeps the last rendered index page and drops it on
//! invalidation, so the next full page load re-reads the store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Categories of writes that make cached reads stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    TaskCreated,
    TaskToggled,
    TaskUpdated,
    TaskDeleted,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::TaskCreated => "created",
            MutationKind::TaskToggled => "toggled",
            MutationKind::TaskUpdated => "updated",
            MutationKind::TaskDeleted => "deleted",
        }
    }
}

/// Hook called after a successful write.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, kind: MutationKind);
}

/// Invalidator for callers with nothing cached (CLI, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvalidator;

impl CacheInvalidator for NoopInvalidator {
    fn invalidate(&self, _kind: MutationKind) {}
}

/// Cached HTML of the index page, tagged with the generation it was rendered at.
///
/// A render started before an invalidation is not stored: `store` only
/// accepts a page whose generation is still current.
pub struct PageCache {
    generation: AtomicU64,
    page: Mutex<Option<(u64, String)>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            page: Mutex::new(None),
        }
    }

    /// Current generation; take it before reading the store for a render.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Cached page, if one is stored for the current generation.
    pub fn get(&self) -> Option<String> {
        let current = self.generation();
        let page = self.page.lock().ok()?;
        match page.as_ref() {
            Some((generation, html)) if *generation == current => Some(html.clone()),
            _ => None,
        }
    }

    /// Store a page rendered at `generation`. Returns `false` if it was stale.
    pub fn store(&self, generation: u64, html: String) -> bool {
        let Ok(mut page) = self.page.lock() else {
            return false;
        };
        if generation != self.generation() {
            return false;
        }
        *page = Some((generation, html));
        true
    }

    pub fn is_cached(&self) -> bool {
        self.get().is_some()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheInvalidator for PageCache {
    fn invalidate(&self, kind: MutationKind) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Ok(mut page) = self.page.lock() {
            *page = None;
        }
        tracing::debug!(mutation = kind.as_str(), generation, "Page cache invalidated");
    }
}
