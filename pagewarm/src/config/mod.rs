//! Configuration file support.
//!
//! Settings live in an INI file at [`config_file_path`]:
//!
//! ```ini
//! [api]
//! base_url = https://example.com/api/
//!
//! [preload]
//! startup_pages = home, about-us
//! max_critical = 15
//!
//! [readiness]
//! selectors = img
//!
//! [logging]
//! level = info
//! ```
//!
//! Every key is optional. CLI arguments override file values.

mod file;
mod keys;

pub use file::{
    config_file_path, ApiSettings, ConfigError, ConfigFile, LoggingSettings, PreloadSettings,
    ReadinessSettings, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_STARTUP_PAGES,
};
pub use keys::ConfigKey;
