//! Application configuration for [`App`](super::App).

use std::time::Duration;

use crate::config::ConfigFile;
use crate::loading::LoadingConfig;
use crate::preload::PreloadConfig;
use crate::readiness::ReadinessConfig;

/// Everything needed to wire an [`App`](super::App).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the content API.
    pub api_base_url: String,

    /// Request timeout for content documents.
    pub api_timeout: Duration,

    /// Tier budgets, batch sizes and per-image timeout.
    pub preload: PreloadConfig,

    /// Strategies warmed by [`App::warm_startup_pages`](super::App::warm_startup_pages).
    pub startup_pages: Vec<String>,

    /// Content cache size in documents.
    pub cache_capacity: u64,

    /// Content cache entry lifetime.
    pub cache_ttl: Duration,

    /// Prober timing for page loads.
    pub readiness: ReadinessConfig,

    /// Page load defaults; the page id is set per controller.
    pub loading: LoadingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

impl AppConfig {
    /// Translate the configuration file into application settings.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            api_base_url: config.api.base_url.clone(),
            api_timeout: Duration::from_secs(config.api.timeout_secs),
            preload: config.preload.to_preload_config(),
            startup_pages: config.preload.startup_pages.clone(),
            cache_capacity: config.preload.cache_capacity,
            cache_ttl: Duration::from_secs(config.preload.cache_ttl_secs),
            readiness: config.readiness.to_readiness_config(),
            loading: config.readiness.to_loading_config(),
        }
    }

    /// Override the API base URL, e.g. from `--api-url`.
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    /// Override the startup pages.
    pub fn with_startup_pages<S: Into<String>>(mut self, pages: impl IntoIterator<Item = S>) -> Self {
        self.startup_pages = pages.into_iter().map(Into::into).collect();
        self
    }
}
