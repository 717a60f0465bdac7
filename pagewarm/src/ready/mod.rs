//! Page-ready signals.
//!
//! Pages that know better than the generic image poller when their content
//! has arrived can raise an explicit "ready" flag. The registry is a plain
//! keyed boolean store shared by `Arc`; nothing here is process-global.
//!
//! # Lifecycle
//!
//! ```text
//! mount   -> register(id)   id: false
//! data in -> signal(id)     id: true
//! unmount -> clear(id)      id: <absent>
//! ```
//!
//! An absent key and a key registered as `false` both read as not ready.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pagewarm::ready::PageReadyRegistry;
//!
//! let registry = Arc::new(PageReadyRegistry::new());
//!
//! let handle = PageReadyRegistry::track(&registry, "home");
//! assert!(!registry.is_ready("home"));
//!
//! handle.update(true);
//! assert!(registry.is_ready("home"));
//!
//! drop(handle);
//! assert!(!registry.is_ready("home"));
//! ```

mod handle;
mod registry;

pub use handle::PageReadyHandle;
pub use registry::PageReadyRegistry;
