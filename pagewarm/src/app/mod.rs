//! Application bootstrap.
//!
//! [`App`] wires the readiness, loading and preload services for one site
//! from an [`AppConfig`]:
//!
//! ```text
//! ConfigFile ──► AppConfig ──► App
//!                               ├── PreloadManager ──► PageContentCache
//!                               │     ├── HttpContentSource  (JSON)
//!                               │     └── HttpImageFetcher   (images)
//!                               ├── PageReadyRegistry
//!                               └── DocumentImages ──► PageLoadingController (per page)
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::App;
pub use config::AppConfig;
pub use error::AppError;
