//! Application wiring.

use std::sync::Arc;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::loading::{LoadingConfig, PageLoadingController};
use crate::preload::{
    ContentSource, HttpContentSource, HttpImageFetcher, ImageFetcher, PageContentCache,
    PreloadManager,
};
use crate::readiness::{DocumentImages, ImageReadinessProber};
use crate::ready::PageReadyRegistry;

/// One site's readiness and preloading services.
///
/// Owns the shared pieces every page needs: the content cache filled by
/// preloading, the page-ready registry, and the live image document that
/// page loads probe.
///
/// # Example
///
/// ```ignore
/// let app = App::new(AppConfig::from_config_file(&ConfigFile::load()?))?;
///
/// let warmup = app.warm_startup_pages();
///
/// let home = app.page_loading("home");
/// home.start(vec![fetch_home()]).await;
/// ```
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    preload: PreloadManager,
    registry: Arc<PageReadyRegistry>,
    document: Arc<DocumentImages>,
}

impl App {
    /// Wire the application against the HTTP content API.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let content = HttpContentSource::with_timeout(&config.api_base_url, config.api_timeout)?;
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::ImageClient(e.to_string()))?;
        let fetcher = HttpImageFetcher::new(client, Some(content.base_url().clone()));

        info!(
            api = %content.base_url(),
            startup_pages = ?config.startup_pages,
            "Application configured"
        );

        Ok(Self::with_sources(
            config,
            Arc::new(content),
            Arc::new(fetcher),
        ))
    }

    /// Wire the application against custom content and image sources.
    pub fn with_sources(
        config: AppConfig,
        content: Arc<dyn ContentSource>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let cache = Arc::new(PageContentCache::new(config.cache_capacity, config.cache_ttl));
        let preload = PreloadManager::new(content, cache, fetcher, config.preload.clone());

        Self {
            config,
            preload,
            registry: Arc::new(PageReadyRegistry::new()),
            document: Arc::new(DocumentImages::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn preload(&self) -> &PreloadManager {
        &self.preload
    }

    pub fn cache(&self) -> &Arc<PageContentCache> {
        self.preload.cache()
    }

    /// Registry pages signal readiness through.
    pub fn ready_registry(&self) -> &Arc<PageReadyRegistry> {
        &self.registry
    }

    /// Images currently mounted in the page being shown.
    pub fn document(&self) -> &Arc<DocumentImages> {
        &self.document
    }

    /// Warm the configured startup pages in the background.
    ///
    /// Never fails; strategy errors are logged. Awaiting the handle is
    /// optional.
    pub fn warm_startup_pages(&self) -> JoinHandle<()> {
        let preload = self.preload.clone();
        let pages = self.config.startup_pages.clone();
        tokio::spawn(async move {
            preload.execute_strategies(&pages).await;
        })
    }

    /// A loading controller for `page_id`, bound to the app's document and
    /// ready registry.
    pub fn page_loading(&self, page_id: &str) -> PageLoadingController {
        let source: Arc<DocumentImages> = Arc::clone(&self.document);
        let prober = ImageReadinessProber::with_config(source, self.config.readiness.clone())
            .with_ready_signal(Arc::clone(&self.registry), page_id);
        let config = LoadingConfig {
            page_id: Some(page_id.to_string()),
            ..self.config.loading.clone()
        };
        PageLoadingController::new(prober, config)
    }
}
