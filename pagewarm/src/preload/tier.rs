//! Priority tiers and the positional partitioning of image URLs.
//!
//! Document order stands in for "what the visitor sees first": the first
//! URLs found in a page's JSON are the hero and above-the-fold imagery.
//!
//! ```text
//! urls:  [0 ........ 14][15 ........ 44][45 ........ 64][65 ...]
//! tier:     critical          high            low        dropped
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Default number of critical images per page.
pub const DEFAULT_MAX_CRITICAL_IMAGES: usize = 15;

/// Default number of high-priority images per page.
pub const DEFAULT_MAX_HIGH_IMAGES: usize = 30;

/// Default number of low-priority images per page.
pub const DEFAULT_MAX_LOW_IMAGES: usize = 20;

/// Default batch size for critical images.
pub const DEFAULT_CONCURRENT_CRITICAL: usize = 6;

/// Default batch size for high-priority images.
pub const DEFAULT_CONCURRENT_HIGH: usize = 4;

/// Default batch size for low-priority images.
pub const DEFAULT_CONCURRENT_LOW: usize = 2;

/// Default per-image load timeout in milliseconds.
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 8000;

/// Preload priority of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Low,
}

impl Priority {
    /// All tiers in load order.
    pub const ALL: [Priority; 3] = [Priority::Critical, Priority::High, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budgets and limits for image preloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadConfig {
    pub max_critical_images_per_page: usize,
    pub max_high_images_per_page: usize,
    pub max_low_images_per_page: usize,

    pub max_concurrent_critical: usize,
    pub max_concurrent_high: usize,
    pub max_concurrent_low: usize,

    /// Upper bound on a single image load.
    pub image_timeout: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_critical_images_per_page: DEFAULT_MAX_CRITICAL_IMAGES,
            max_high_images_per_page: DEFAULT_MAX_HIGH_IMAGES,
            max_low_images_per_page: DEFAULT_MAX_LOW_IMAGES,
            max_concurrent_critical: DEFAULT_CONCURRENT_CRITICAL,
            max_concurrent_high: DEFAULT_CONCURRENT_HIGH,
            max_concurrent_low: DEFAULT_CONCURRENT_LOW,
            image_timeout: Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS),
        }
    }
}

impl PreloadConfig {
    /// Number of images a tier may hold.
    pub fn budget(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.max_critical_images_per_page,
            Priority::High => self.max_high_images_per_page,
            Priority::Low => self.max_low_images_per_page,
        }
    }

    /// Batch size for a tier (minimum 1).
    pub fn concurrency(&self, priority: Priority) -> usize {
        let limit = match priority {
            Priority::Critical => self.max_concurrent_critical,
            Priority::High => self.max_concurrent_high,
            Priority::Low => self.max_concurrent_low,
        };
        limit.max(1)
    }

    /// Total number of images that can be loaded for one page.
    pub fn total_budget(&self) -> usize {
        Priority::ALL.iter().map(|p| self.budget(*p)).sum()
    }
}

/// Image URLs split into priority tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TieredUrls {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub low: Vec<String>,
    /// URLs beyond every budget; these are never loaded.
    pub dropped: usize,
}

impl TieredUrls {
    /// Partition `urls` by position using the tier budgets in `config`.
    pub fn partition(urls: Vec<String>, config: &PreloadConfig) -> Self {
        let total_budget = config.total_budget();
        let dropped = urls.len().saturating_sub(total_budget);

        let mut remaining = urls.into_iter().take(total_budget);
        let critical: Vec<String> = remaining
            .by_ref()
            .take(config.budget(Priority::Critical))
            .collect();
        let high: Vec<String> = remaining
            .by_ref()
            .take(config.budget(Priority::High))
            .collect();
        let low: Vec<String> = remaining.take(config.budget(Priority::Low)).collect();

        Self {
            critical,
            high,
            low,
            dropped,
        }
    }

    /// URLs of one tier.
    pub fn tier(&self, priority: Priority) -> &[String] {
        match priority {
            Priority::Critical => &self.critical,
            Priority::High => &self.high,
            Priority::Low => &self.low,
        }
    }

    /// Tiers in load order.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &[String])> {
        Priority::ALL.into_iter().map(move |p| (p, self.tier(p)))
    }

    /// Number of URLs that will be loaded.
    pub fn len(&self) -> usize {
        self.critical.len() + self.high.len() + self.low.len()
    }

    /// Whether no URL will be loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
