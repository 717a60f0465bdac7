//! Mount-scoped page-ready handle.

use std::sync::Arc;

use super::registry::PageReadyRegistry;

/// Registration held by a mounted page.
///
/// Created by [`PageReadyRegistry::track`]. The page id is registered on
/// creation and cleared on drop, so a flag never outlives the page that
/// raised it. Dropping a handle whose registration was replaced by a newer
/// handle for the same id leaves the newer entry in place.
#[derive(Debug)]
pub struct PageReadyHandle {
    registry: Arc<PageReadyRegistry>,
    page_id: String,
    stamp: u64,
}

impl PageReadyHandle {
    pub(super) fn new(registry: Arc<PageReadyRegistry>, page_id: String) -> Self {
        let stamp = registry.register_stamped(&page_id);
        Self {
            registry,
            page_id,
            stamp,
        }
    }

    /// Report the page's current data readiness.
    ///
    /// Only a `true` value has an effect; a page does not become un-ready
    /// while mounted.
    pub fn update(&self, is_ready: bool) {
        if is_ready {
            self.registry.signal(&self.page_id);
        }
    }

    /// The page id this handle registered.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}

impl Drop for PageReadyHandle {
    fn drop(&mut self) {
        self.registry.clear_registration(&self.page_id, self.stamp);
    }
}
