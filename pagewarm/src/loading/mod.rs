//! Page loading state.
//!
//! A [`PageLoadingController`] turns "some API calls plus whatever images the
//! page mounts" into a single loading flag a view can render against:
//!
//! ```text
//! start(calls) ── settle all calls ──> wait for images ──> Loaded
//!      │                (join, no fail-fast)     (prober)
//!      └── any newer start() or dispose() ──> results discarded
//! ```
//!
//! State is published through a `tokio::sync::watch` channel so any number of
//! observers can follow it.

mod controller;
mod state;

pub use controller::{LoadingConfig, PageLoadingController, DEFAULT_IMAGE_TIMEOUT_MS};
pub use state::{LoadingPhase, LoadingProgress, LoadingState};
