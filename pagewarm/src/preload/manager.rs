//! Preload manager: runs named strategies and never fails its caller.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{error, info, warn};

use super::cache::PageContentCache;
use super::content::ContentSource;
use super::error::PreloadError;
use super::loader::{ImageFetcher, TieredImageLoader};
use super::report::{PreloadPlan, PreloadReport};
use super::strategy::{PreloadContext, StrategyRegistry};
use super::tier::PreloadConfig;

/// Runs preload strategies by name.
///
/// # Example
///
/// ```ignore
/// let manager = PreloadManager::new(content, cache, fetcher, PreloadConfig::default());
///
/// // Fire-and-forget at startup; failures are logged, never returned.
/// manager.execute_strategies(&["home", "about-us"]).await;
/// ```
#[derive(Debug, Clone)]
pub struct PreloadManager {
    context: PreloadContext,
    registry: StrategyRegistry,
}

impl PreloadManager {
    /// Create a manager with the standard page strategies.
    pub fn new(
        content: Arc<dyn ContentSource>,
        cache: Arc<PageContentCache>,
        fetcher: Arc<dyn ImageFetcher>,
        config: PreloadConfig,
    ) -> Self {
        Self::with_registry(content, cache, fetcher, config, StrategyRegistry::standard())
    }

    /// Create a manager with a custom strategy registry.
    pub fn with_registry(
        content: Arc<dyn ContentSource>,
        cache: Arc<PageContentCache>,
        fetcher: Arc<dyn ImageFetcher>,
        config: PreloadConfig,
        registry: StrategyRegistry,
    ) -> Self {
        Self {
            context: PreloadContext {
                content,
                cache,
                loader: TieredImageLoader::new(fetcher, config),
            },
            registry,
        }
    }

    /// Names of every registered strategy.
    pub fn available_strategies(&self) -> Vec<String> {
        self.registry.names()
    }

    /// The strategy registry.
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// The content cache strategies fill.
    pub fn cache(&self) -> &Arc<PageContentCache> {
        &self.context.cache
    }

    /// Run one strategy and report what it did.
    pub async fn run_strategy(&self, name: &str) -> Result<PreloadReport, PreloadError> {
        let strategy = self
            .registry
            .get(name)
            .ok_or_else(|| PreloadError::UnknownStrategy(name.to_string()))?;

        AssertUnwindSafe(strategy.execute(&self.context))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(PreloadError::Panicked(name.to_string())))
    }

    /// Fetch a strategy's content and return its tiered image plan without
    /// loading any image.
    pub async fn plan_strategy(&self, name: &str) -> Result<PreloadPlan, PreloadError> {
        let strategy = self
            .registry
            .get(name)
            .ok_or_else(|| PreloadError::UnknownStrategy(name.to_string()))?;

        AssertUnwindSafe(strategy.plan(&self.context))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(PreloadError::Panicked(name.to_string())))
    }

    /// Run several strategies concurrently and collect each outcome.
    pub async fn run_strategies<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Vec<(String, Result<PreloadReport, PreloadError>)> {
        join_all(names.iter().map(|name| async move {
            let name = name.as_ref();
            (name.to_string(), self.run_strategy(name).await)
        }))
        .await
    }

    /// Run one strategy; failures are logged and swallowed.
    pub async fn execute_strategy(&self, name: &str) {
        match self.run_strategy(name).await {
            Ok(report) => info!(
                strategy = name,
                documents = report.documents,
                loaded = report.loaded(),
                failed = report.failed(),
                dropped = report.dropped,
                elapsed_ms = report.elapsed_ms,
                "Preload strategy finished"
            ),
            Err(e @ PreloadError::Panicked(_)) => {
                error!(strategy = name, error = %e, "Preload strategy failed")
            }
            Err(e) => warn!(strategy = name, error = %e, "Preload strategy failed"),
        }
    }

    /// Run several strategies concurrently; one failing never affects the others.
    pub async fn execute_strategies<S: AsRef<str>>(&self, names: &[S]) {
        join_all(names.iter().map(|name| self.execute_strategy(name.as_ref()))).await;
    }
}
