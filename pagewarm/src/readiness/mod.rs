//! Image readiness probing.
//!
//! There is no single "all images settled" notification for a rendered
//! document, so the prober polls an [`ImageSource`] once per frame until one
//! of its exit conditions holds:
//!
//! ```text
//! tick ──> query(selectors)
//!            │
//!            ├─ elapsed > timeout ...................... resolve (partial)
//!            ├─ no images && elapsed < grace ........... keep polling
//!            ├─ loaded == total ........................ resolve
//!            ├─ count unchanged for N windows, loaded>0  resolve (early)
//!            └─ otherwise .............................. next tick
//! ```
//!
//! "Loaded" means `complete && natural_height > 0`; `complete` alone is also
//! true for broken images.
//!
//! The prober never fails. Every exit path yields an [`ImageCounts`].

mod config;
mod document;
mod prober;

pub use config::{
    ReadinessConfig, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_NO_IMAGE_GRACE_MS,
    DEFAULT_STABILITY_WINDOW_MS, DEFAULT_STABLE_WINDOWS_REQUIRED,
};
pub use document::{check_selector, DocumentImages, ImageElement, ImageSnapshot, ImageSource};
pub use prober::{ImageCounts, ImageReadinessProber};
