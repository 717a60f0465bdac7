//! Named preload strategies.
//!
//! Every page strategy has the same shape:
//!
//! 1. fetch the page's JSON (plus shared documents such as the footer)
//!    through the content cache, before any image work
//! 2. collect image URLs from the fetched documents
//! 3. partition them into tiers and load tier by tier

use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use super::cache::PageContentCache;
use super::content::{ContentKey, ContentSource, PageSlug};
use super::error::PreloadError;
use super::extract::collect_image_urls_from;
use super::loader::TieredImageLoader;
use super::report::{PreloadPlan, PreloadReport};
use super::tier::TieredUrls;

/// Collaborators a strategy runs against.
#[derive(Clone)]
pub struct PreloadContext {
    pub content: Arc<dyn ContentSource>,
    pub cache: Arc<PageContentCache>,
    pub loader: TieredImageLoader,
}

impl std::fmt::Debug for PreloadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadContext")
            .field("cache", &self.cache)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

/// A named, repeatable preload routine.
pub trait PreloadStrategy: Send + Sync {
    /// Registry key, e.g. `"home"`.
    fn name(&self) -> &str;

    /// One-line human description.
    fn description(&self) -> &str;

    /// Documents the strategy fetches.
    fn content_keys(&self) -> Vec<ContentKey>;

    /// Fetch the strategy's content and decide which images it would load.
    fn plan<'a>(
        &'a self,
        context: &'a PreloadContext,
    ) -> BoxFuture<'a, Result<PreloadPlan, PreloadError>>;

    /// Run the strategy.
    fn execute<'a>(
        &'a self,
        context: &'a PreloadContext,
    ) -> BoxFuture<'a, Result<PreloadReport, PreloadError>>;
}

/// Strategy for one content page.
///
/// The primary document must load; secondary documents (footer, listings)
/// are best effort and only contribute images when they arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStrategy {
    name: String,
    description: String,
    primary: ContentKey,
    secondary: Vec<ContentKey>,
}

impl PageStrategy {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        primary: ContentKey,
        secondary: Vec<ContentKey>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            primary,
            secondary,
        }
    }

    async fn prepare(&self, context: &PreloadContext) -> Result<PreloadPlan, PreloadError> {
        let source = context.content.as_ref();

        let primary = context.cache.get_or_fetch(self.primary, source);
        let secondary = join_all(
            self.secondary
                .iter()
                .map(|key| context.cache.get_or_fetch(*key, source)),
        );
        let (primary, secondary) = futures::join!(primary, secondary);

        let primary = primary.map_err(|source| PreloadError::Content {
            key: self.primary,
            source,
        })?;

        let mut documents: Vec<Arc<Value>> = vec![primary];
        for (key, outcome) in self.secondary.iter().zip(secondary) {
            match outcome {
                Ok(document) => documents.push(document),
                Err(e) => warn!(strategy = %self.name, %key, error = %e, "Secondary content unavailable"),
            }
        }

        let urls = collect_image_urls_from(documents.iter().map(|d| d.as_ref()));
        let tiers = TieredUrls::partition(urls, context.loader.config());
        debug!(
            strategy = %self.name,
            documents = documents.len(),
            critical = tiers.critical.len(),
            high = tiers.high.len(),
            low = tiers.low.len(),
            dropped = tiers.dropped,
            "Preload plan ready"
        );

        Ok(PreloadPlan {
            strategy: self.name.clone(),
            documents: documents.len(),
            tiers,
        })
    }

    async fn run(&self, context: &PreloadContext) -> Result<PreloadReport, PreloadError> {
        let started = Instant::now();
        let plan = self.prepare(context).await?;
        let results = context.loader.load(&plan.tiers).await;

        Ok(PreloadReport::new(
            &self.name,
            plan.documents,
            &results,
            plan.tiers.dropped,
            started.elapsed(),
        ))
    }
}

impl PreloadStrategy for PageStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn content_keys(&self) -> Vec<ContentKey> {
        std::iter::once(self.primary)
            .chain(self.secondary.iter().copied())
            .collect()
    }

    fn plan<'a>(
        &'a self,
        context: &'a PreloadContext,
    ) -> BoxFuture<'a, Result<PreloadPlan, PreloadError>> {
        self.prepare(context).boxed()
    }

    fn execute<'a>(
        &'a self,
        context: &'a PreloadContext,
    ) -> BoxFuture<'a, Result<PreloadReport, PreloadError>> {
        self.run(context).boxed()
    }
}

/// Ordered lookup of strategies by name.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn PreloadStrategy>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The marketing site's page strategies.
    pub fn standard() -> Self {
        let footer = ContentKey::Page(PageSlug::Footer);
        let mut registry = Self::new();
        registry.register(PageStrategy::new(
            "home",
            "Home page content, footer and hero imagery",
            ContentKey::Page(PageSlug::Home),
            vec![footer],
        ));
        registry.register(PageStrategy::new(
            "about-us",
            "About-us page content and team imagery",
            ContentKey::Page(PageSlug::AboutUs),
            vec![footer],
        ));
        registry.register(PageStrategy::new(
            "complex",
            "Residential complex page and gallery",
            ContentKey::Page(PageSlug::Complex),
            vec![footer],
        ));
        registry.register(PageStrategy::new(
            "apartments",
            "Apartment listing page and flat cover images",
            ContentKey::Page(PageSlug::Apartments),
            vec![ContentKey::ApartmentList, footer],
        ));
        registry
    }

    /// Add a strategy, replacing any strategy with the same name.
    pub fn register(&mut self, strategy: impl PreloadStrategy + 'static) {
        let strategy: Arc<dyn PreloadStrategy> = Arc::new(strategy);
        match self
            .strategies
            .iter_mut()
            .find(|s| s.name() == strategy.name())
        {
            Some(existing) => *existing = strategy,
            None => self.strategies.push(strategy),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PreloadStrategy>> {
        self.strategies.iter().find(|s| s.name() == name).cloned()
    }

    /// Strategy names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// All strategies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PreloadStrategy>> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
