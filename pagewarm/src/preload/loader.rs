//! Tiered image loading.
//!
//! Tiers load strictly one after another. Inside a tier, URLs are dispatched
//! in fixed-size batches and the whole batch settles before the next one
//! starts:
//!
//! ```text
//! critical: [6][6][3] ─┐
//!                      └─> high: [4][4]...[4] ─┐
//!                                              └─> low: [2][2]...
//! ```
//!
//! Each load races a timeout and always yields an [`ImageLoadResult`].

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use image::ImageReader;
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::error::ImageLoadError;
use super::tier::{PreloadConfig, Priority, TieredUrls};

/// Dimensions of a successfully decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Loads and decodes one image.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<LoadedImage, ImageLoadError>>;
}

/// Outcome of one preload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLoadResult {
    pub url: String,
    pub loaded: bool,
    pub priority: Priority,
}

/// Read image dimensions from the encoded header.
pub fn decode_dimensions(body: &[u8]) -> Result<(u32, u32), String> {
    let (width, height) = ImageReader::new(Cursor::new(body))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| e.to_string())?;

    if height == 0 {
        return Err("image has zero height".to_string());
    }
    Ok((width, height))
}

/// HTTP image fetcher.
///
/// Raster images must decode to a non-zero height. SVG documents cannot be
/// decoded here and count as loaded when their body is non-empty.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    base_url: Option<Url>,
}

impl HttpImageFetcher {
    /// Create a fetcher. Root-relative URLs resolve against `base_url`.
    pub fn new(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    /// Absolute URL for `url`.
    pub fn resolve(&self, url: &str) -> Result<Url, ImageLoadError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(_) => {
                let base = self.base_url.as_ref().ok_or_else(|| ImageLoadError::InvalidUrl {
                    url: url.to_string(),
                    reason: "relative URL without a base".to_string(),
                })?;
                base.join(url).map_err(|e| ImageLoadError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<LoadedImage, ImageLoadError> {
        let resolved = self.resolve(url)?;

        let response = self
            .client
            .get(resolved.clone())
            .send()
            .await
            .map_err(|e| ImageLoadError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageLoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_svg = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("svg"))
            || resolved.path().to_ascii_lowercase().ends_with(".svg");

        let body: Bytes = response.bytes().await.map_err(|e| ImageLoadError::Http {
            url: url.to_string(),
            reason: format!("failed to read response: {}", e),
        })?;

        if is_svg {
            if body.is_empty() {
                return Err(ImageLoadError::Decode {
                    url: url.to_string(),
                    reason: "empty SVG document".to_string(),
                });
            }
            return Ok(LoadedImage {
                width: 0,
                height: 0,
                bytes: body.len(),
            });
        }

        let (width, height) = decode_dimensions(&body).map_err(|reason| ImageLoadError::Decode {
            url: url.to_string(),
            reason,
        })?;

        Ok(LoadedImage {
            width,
            height,
            bytes: body.len(),
        })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<LoadedImage, ImageLoadError>> {
        self.fetch_image(url).boxed()
    }
}

/// Loads tiered URLs with per-tier batching and per-image timeouts.
#[derive(Clone)]
pub struct TieredImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    config: PreloadConfig,
}

impl std::fmt::Debug for TieredImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredImageLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TieredImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: PreloadConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.config
    }

    /// Load every tier in order. Results are in dispatch order.
    pub async fn load(&self, tiers: &TieredUrls) -> Vec<ImageLoadResult> {
        let mut results = Vec::with_capacity(tiers.len());

        for (priority, urls) in tiers.iter() {
            if urls.is_empty() {
                continue;
            }

            let batch_size = self.config.concurrency(priority);
            let mut loaded = 0usize;
            for batch in urls.chunks(batch_size) {
                let batch_results =
                    join_all(batch.iter().map(|url| self.load_one(url, priority))).await;
                loaded += batch_results.iter().filter(|r| r.loaded).count();
                results.extend(batch_results);
            }

            debug!(
                tier = %priority,
                loaded,
                failed = urls.len() - loaded,
                batch_size,
                "Preload tier settled"
            );
        }

        results
    }

    /// Load one image. Never fails; timeouts and errors yield `loaded: false`.
    pub async fn load_one(&self, url: &str, priority: Priority) -> ImageLoadResult {
        let loaded = match timeout(self.config.image_timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(image)) => {
                trace!(url, width = image.width, height = image.height, "Image preloaded");
                true
            }
            Ok(Err(e)) => {
                trace!(url, error = %e, "Image preload failed");
                false
            }
            Err(_) => {
                trace!(
                    url,
                    timeout_ms = self.config.image_timeout.as_millis() as u64,
                    "Image preload timed out"
                );
                false
            }
        };

        ImageLoadResult {
            url: url.to_string(),
            loaded,
            priority,
        }
    }

    /// Per-image timeout.
    pub fn image_timeout(&self) -> Duration {
        self.config.image_timeout
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio::time::{self, Instant};

    /// Scripted fetcher that records when each load starts and finishes.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        /// Per-URL delay; URLs not listed load after 10ms.
        pub delays: HashMap<String, Duration>,
        /// URLs that fail to decode.
        pub broken: Vec<String>,
        pub events: Mutex<Vec<(String, &'static str, Instant)>>,
    }

    impl ScriptedFetcher {
        pub fn started(&self) -> Vec<String> {
            self.events
                .lock()
                .iter()
                .filter(|(_, kind, _)| *kind == "start")
                .map(|(url, _, _)| url.clone())
                .collect()
        }

        pub fn event_time(&self, url: &str, kind: &str) -> Option<Instant> {
            self.events
                .lock()
                .iter()
                .find(|(u, k, _)| u == url && *k == kind)
                .map(|(_, _, at)| *at)
        }
    }

    impl ImageFetcher for ScriptedFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<LoadedImage, ImageLoadError>> {
            async move {
                self.events
                    .lock()
                    .push((url.to_string(), "start", Instant::now()));
                let delay = self
                    .delays
                    .get(url)
                    .copied()
                    .unwrap_or(Duration::from_millis(10));
                time::sleep(delay).await;
                self.events
                    .lock()
                    .push((url.to_string(), "end", Instant::now()));

                if self.broken.iter().any(|b| b == url) {
                    Err(ImageLoadError::Decode {
                        url: url.to_string(),
                        reason: "corrupt".to_string(),
                    })
                } else {
                    Ok(LoadedImage {
                        width: 10,
                        height: 10,
                        bytes: 100,
                    })
                }
            }
            .boxed()
        }
    }

    fn urls(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("/media/{}.jpg", i)).collect()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_dimensions_png() {
        assert_eq!(decode_dimensions(&png(4, 3)), Ok((4, 3)));
    }

    #[test]
    fn test_decode_dimensions_garbage() {
        assert!(decode_dimensions(b"<html>not an image</html>").is_err());
        assert!(decode_dimensions(&[]).is_err());
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        let fetcher = HttpImageFetcher::new(Client::new(), Some(base));

        assert_eq!(
            fetcher.resolve("/media/a.jpg").unwrap().as_str(),
            "https://api.example.com/media/a.jpg"
        );
        assert_eq!(
            fetcher.resolve("https://cdn.example.com/b.png").unwrap().as_str(),
            "https://cdn.example.com/b.png"
        );
    }

    #[test]
    fn test_resolve_relative_without_base_fails() {
        let fetcher = HttpImageFetcher::new(Client::new(), None);
        assert!(matches!(
            fetcher.resolve("/media/a.jpg"),
            Err(ImageLoadError::InvalidUrl { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_not_loaded() {
        let mut fetcher = ScriptedFetcher::default();
        fetcher
            .delays
            .insert("/media/slow.jpg".to_string(), Duration::from_secs(60));
        let loader = TieredImageLoader::new(Arc::new(fetcher), PreloadConfig::default());

        let started = Instant::now();
        let result = loader.load_one("/media/slow.jpg", Priority::High).await;

        assert!(!result.loaded);
        assert_eq!(result.priority, Priority::High);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(8000));
        assert!(elapsed < Duration::from_millis(8100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_image_does_not_abort_batch() {
        let fetcher = ScriptedFetcher {
            broken: vec!["/media/1.jpg".to_string()],
            ..ScriptedFetcher::default()
        };
        let loader = TieredImageLoader::new(Arc::new(fetcher), PreloadConfig::default());
        let tiers = TieredUrls::partition(urls(3), loader.config());

        let results = loader.load(&tiers).await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.loaded).collect::<Vec<_>>(),
            vec![true, false, true]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_tier_settles_before_high_starts() {
        let mut fetcher = ScriptedFetcher::default();
        // The last critical image is slow; no high image may start before it ends.
        fetcher
            .delays
            .insert("/media/14.jpg".to_string(), Duration::from_secs(5));
        let fetcher = Arc::new(fetcher);
        let loader = TieredImageLoader::new(
            Arc::clone(&fetcher) as Arc<dyn ImageFetcher>,
            PreloadConfig::default(),
        );
        let tiers = TieredUrls::partition(urls(20), loader.config());

        loader.load(&tiers).await;

        let critical_done = fetcher.event_time("/media/14.jpg", "end").unwrap();
        let first_high = fetcher.event_time("/media/15.jpg", "start").unwrap();
        assert!(first_high >= critical_done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_respect_concurrency() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let loader = TieredImageLoader::new(
            Arc::clone(&fetcher) as Arc<dyn ImageFetcher>,
            PreloadConfig::default(),
        );
        let tiers = TieredUrls::partition(urls(15), loader.config());

        let started = Instant::now();
        loader.load(&tiers).await;

        // 15 critical images in batches of 6 -> 3 rounds of 10ms each.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(30));
        assert!(elapsed < Duration::from_millis(40));
        let seventh = fetcher.event_time("/media/6.jpg", "start").unwrap();
        let first_end = fetcher.event_time("/media/0.jpg", "end").unwrap();
        assert!(seventh >= first_end);
    }

    #[tokio::test(start_paused = true)]
    async fn test_urls_beyond_budget_are_never_requested() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let loader = TieredImageLoader::new(
            Arc::clone(&fetcher) as Arc<dyn ImageFetcher>,
            PreloadConfig::default(),
        );
        let tiers = TieredUrls::partition(urls(100), loader.config());

        let results = loader.load(&tiers).await;

        let started = fetcher.started();
        assert_eq!(started.len(), 65);
        assert_eq!(results.len(), 65);
        assert!(!started.contains(&"/media/65.jpg".to_string()));
        assert!(started.contains(&"/media/64.jpg".to_string()));
    }
}
