//! Priority-tiered content and image preloading.
//!
//! A preload strategy warms a page before the visitor navigates to it:
//! the page's JSON documents are fetched into a shared [`PageContentCache`],
//! every image URL referenced by those documents is collected, and the
//! images are loaded in three tiers.
//!
//! | Tier     | Images (default) | Concurrency |
//! |----------|------------------|-------------|
//! | critical | first 15         | 6           |
//! | high     | next 30          | 4           |
//! | low      | next 20          | 2           |
//!
//! A tier starts only when the previous tier has settled, and within a tier
//! images load in batches of the tier's concurrency. Failures never escape
//! [`PreloadManager::execute_strategies`]: a broken image counts as not
//! loaded, a failed strategy is logged and its siblings keep running.

mod cache;
pub mod content;
mod error;
mod extract;
pub mod loader;
mod manager;
mod report;
mod strategy;
mod tier;

pub use cache::{
    ContentCacheStats, PageContentCache, DEFAULT_CONTENT_CACHE_CAPACITY,
    DEFAULT_CONTENT_CACHE_TTL_SECS,
};
pub use content::{
    parse_base_url, ContentKey, ContentSource, HttpContentSource, PageSlug,
    DEFAULT_CONTENT_TIMEOUT_SECS,
};
pub use error::{FetchError, ImageLoadError, PreloadError};
pub use extract::{collect_image_urls, collect_image_urls_from, is_image_url, STATIC_ASSET_PREFIXES};
pub use loader::{
    decode_dimensions, HttpImageFetcher, ImageFetcher, ImageLoadResult, LoadedImage,
    TieredImageLoader,
};
pub use manager::PreloadManager;
pub use report::{PreloadPlan, PreloadReport, TierReport};
pub use strategy::{PageStrategy, PreloadContext, PreloadStrategy, StrategyRegistry};
pub use tier::{
    PreloadConfig, Priority, TieredUrls, DEFAULT_CONCURRENT_CRITICAL, DEFAULT_CONCURRENT_HIGH,
    DEFAULT_CONCURRENT_LOW, DEFAULT_IMAGE_TIMEOUT_MS, DEFAULT_MAX_CRITICAL_IMAGES,
    DEFAULT_MAX_HIGH_IMAGES, DEFAULT_MAX_LOW_IMAGES,
};
