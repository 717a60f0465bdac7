//! Pagewarm - page readiness and prioritized preloading
//!
//! This library coordinates the moment a marketing page is "ready to show"
//! and warms page content and imagery ahead of navigation:
//!
//! - [`readiness`]: polls a document's images until a settleable subset has rendered
//! - [`loading`]: generation-stamped page loading state (API calls, then images)
//! - [`ready`]: explicit page-ready signals raised by mounted pages
//! - [`preload`]: JSON-first, tiered, bounded-concurrency image preloading
//! - [`app`]: wiring of the above from a [`config::ConfigFile`]
//!
//! # Example
//!
//! ```ignore
//! use pagewarm::app::{App, AppConfig};
//! use pagewarm::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = App::new(config)?;
//!
//! // Fire-and-forget warmup of the landing pages
//! app.warm_startup_pages();
//!
//! // On navigation
//! let controller = app.page_loading("home");
//! controller.start(vec![fetch_listings()]).await;
//! assert!(!controller.state().is_loading);
//! ```

pub mod app;
pub mod config;
pub mod loading;
pub mod logging;
pub mod preload;
pub mod readiness;
pub mod ready;
