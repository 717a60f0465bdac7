//! Keyed page-ready store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::handle::PageReadyHandle;

/// Registry of page-ready flags keyed by page id.
///
/// Lookups never block the async runtime: `DashMap` shards its locks and every
/// operation here is a single short critical section.
#[derive(Debug, Default)]
pub struct PageReadyRegistry {
    pages: DashMap<String, Entry>,
    next_stamp: AtomicU64,
}

/// Ready flag plus the stamp of the registration that created it.
#[derive(Debug, Clone, Copy)]
struct Entry {
    ready: bool,
    stamp: u64,
}

impl PageReadyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page as mounted but not yet ready.
    ///
    /// Re-registering an already signaled page resets it to not ready.
    pub fn register(&self, page_id: &str) {
        self.register_stamped(page_id);
    }

    /// Register a page and return the stamp identifying this registration.
    pub(super) fn register_stamped(&self, page_id: &str) -> u64 {
        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
        self.pages
            .insert(page_id.to_string(), Entry { ready: false, stamp });
        debug!(page_id, stamp, "Page registered");
        stamp
    }

    /// Mark a page as ready.
    ///
    /// An unregistered page gets a fresh entry.
    pub fn signal(&self, page_id: &str) {
        self.pages
            .entry(page_id.to_string())
            .and_modify(|entry| entry.ready = true)
            .or_insert_with(|| Entry {
                ready: true,
                stamp: self.next_stamp.fetch_add(1, Ordering::Relaxed),
            });
        debug!(page_id, "Page signaled ready");
    }

    /// Returns `true` only if the page is registered and has been signaled.
    pub fn is_ready(&self, page_id: &str) -> bool {
        self.pages
            .get(page_id)
            .map(|entry| entry.ready)
            .unwrap_or(false)
    }

    /// Whether the page currently has an entry, ready or not.
    pub fn is_registered(&self, page_id: &str) -> bool {
        self.pages.contains_key(page_id)
    }

    /// Remove a page's entry.
    pub fn clear(&self, page_id: &str) {
        if self.pages.remove(page_id).is_some() {
            trace!(page_id, "Page ready flag cleared");
        }
    }

    /// Remove a page's entry only if it still belongs to registration `stamp`.
    ///
    /// A newer registration under the same id is left alone.
    pub(super) fn clear_registration(&self, page_id: &str, stamp: u64) {
        if self
            .pages
            .remove_if(page_id, |_, entry| entry.stamp == stamp)
            .is_some()
        {
            trace!(page_id, stamp, "Page ready flag cleared");
        }
    }

    /// Number of registered pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no pages are registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Register `page_id` and return a handle that clears it when dropped.
    ///
    /// This is the mount/unmount pairing a page component uses: hold the
    /// handle for as long as the page is mounted and call
    /// [`PageReadyHandle::update`] whenever its own readiness condition changes.
    pub fn track(registry: &Arc<Self>, page_id: impl Into<String>) -> PageReadyHandle {
        PageReadyHandle::new(Arc::clone(registry), page_id.into())
    }
}
