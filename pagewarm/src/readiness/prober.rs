//! Frame-polled image readiness detection.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::config::ReadinessConfig;
use super::document::ImageSource;
use crate::ready::PageReadyRegistry;

/// Selector used when the caller supplies none.
const DEFAULT_SELECTOR: &str = "img";

/// Image counts observed when the prober resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImageCounts {
    /// Images that are complete with a non-zero natural height.
    pub loaded: usize,
    /// Images matching the selectors.
    pub total: usize,
}

/// Why the polling loop stopped. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    AllLoaded,
    Timeout,
    Stable,
}

/// Polls an [`ImageSource`] until its images have settled.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use pagewarm::readiness::{DocumentImages, ImageElement, ImageReadinessProber};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let document = Arc::new(DocumentImages::new());
/// document.insert(ImageElement::new("hero", "/media/hero.jpg"));
/// document.mark_loaded("hero", 720);
///
/// let prober = ImageReadinessProber::new(document);
/// let counts = prober.wait_for_images(&[], Duration::from_secs(30)).await;
/// assert_eq!((counts.loaded, counts.total), (1, 1));
/// # }
/// ```
#[derive(Clone)]
pub struct ImageReadinessProber {
    source: Arc<dyn ImageSource>,
    config: ReadinessConfig,
    ready_signal: Option<(Arc<PageReadyRegistry>, String)>,
}

impl std::fmt::Debug for ImageReadinessProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageReadinessProber")
            .field("config", &self.config)
            .field(
                "ready_signal",
                &self.ready_signal.as_ref().map(|(_, id)| id.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl ImageReadinessProber {
    /// Create a prober with default timing.
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self::with_config(source, ReadinessConfig::default())
    }

    /// Create a prober with custom timing.
    pub fn with_config(source: Arc<dyn ImageSource>, config: ReadinessConfig) -> Self {
        Self {
            source,
            config,
            ready_signal: None,
        }
    }

    /// Let a page-ready signal shorten the wait.
    ///
    /// Once `page_id` is signaled in `registry`, zero matching images are
    /// taken at face value (no mount grace) and one stable window is enough
    /// to resolve early.
    pub fn with_ready_signal(
        mut self,
        registry: Arc<PageReadyRegistry>,
        page_id: impl Into<String>,
    ) -> Self {
        self.ready_signal = Some((registry, page_id.into()));
        self
    }

    /// The timing configuration in use.
    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Wait until the images matching `selectors` have settled.
    ///
    /// An empty selector list means every image. Always resolves, at the
    /// latest one polling interval after `timeout`.
    pub async fn wait_for_images(&self, selectors: &[String], timeout: Duration) -> ImageCounts {
        let default_selectors;
        let selectors = if selectors.is_empty() {
            default_selectors = vec![DEFAULT_SELECTOR.to_string()];
            &default_selectors
        } else {
            selectors
        };

        let start = Instant::now();
        let mut ticker = time::interval(self.config.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut window_started = start;
        let mut window_count: Option<usize> = None;
        let mut stable_windows = 0u32;

        loop {
            ticker.tick().await;

            let now = Instant::now();
            let elapsed = now.duration_since(start);
            let snapshots = self.source.query(selectors);
            let counts = ImageCounts {
                loaded: snapshots.iter().filter(|s| s.is_rendered()).count(),
                total: snapshots.len(),
            };
            let page_ready = self.page_signaled();

            if elapsed > timeout {
                return self.resolve(counts, elapsed, ExitReason::Timeout);
            }

            if counts.total == 0 && elapsed < self.config.no_image_grace && !page_ready {
                continue;
            }

            if counts.loaded == counts.total {
                return self.resolve(counts, elapsed, ExitReason::AllLoaded);
            }

            match window_count {
                None => {
                    window_count = Some(counts.total);
                    window_started = now;
                }
                Some(previous) if now.duration_since(window_started) >= self.config.stability_window => {
                    if previous == counts.total {
                        stable_windows += 1;
                    } else {
                        stable_windows = 0;
                        window_count = Some(counts.total);
                    }
                    window_started = now;
                    trace!(
                        total = counts.total,
                        loaded = counts.loaded,
                        stable_windows,
                        "Image count stability window elapsed"
                    );

                    let required = if page_ready {
                        1
                    } else {
                        self.config.stable_windows_required
                    };
                    if stable_windows >= required && counts.loaded > 0 {
                        return self.resolve(counts, elapsed, ExitReason::Stable);
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn page_signaled(&self) -> bool {
        self.ready_signal
            .as_ref()
            .is_some_and(|(registry, page_id)| registry.is_ready(page_id))
    }

    fn resolve(&self, counts: ImageCounts, elapsed: Duration, reason: ExitReason) -> ImageCounts {
        debug!(
            loaded = counts.loaded,
            total = counts.total,
            elapsed_ms = elapsed.as_millis() as u64,
            reason = ?reason,
            "Image readiness resolved"
        );
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::{DocumentImages, ImageElement};

    fn prober_for(document: &Arc<DocumentImages>) -> ImageReadinessProber {
        ImageReadinessProber::new(Arc::clone(document) as Arc<dyn ImageSource>)
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_loaded_resolves_immediately() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("a", "/media/a.jpg"));
        document.insert(ImageElement::new("b", "/media/b.jpg"));
        document.mark_loaded("a", 100);
        document.mark_loaded("b", 200);

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        assert_eq!(counts, ImageCounts { loaded: 2, total: 2 });
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_images_waits_for_grace_period() {
        let document = Arc::new(DocumentImages::new());

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        let elapsed = started.elapsed();
        assert_eq!(counts, ImageCounts::default());
        assert!(elapsed >= Duration::from_millis(5000));
        assert!(elapsed < Duration::from_millis(5100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_mounted_images_are_picked_up() {
        let document = Arc::new(DocumentImages::new());
        let mounter = Arc::clone(&document);
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(500)).await;
            mounter.insert(ImageElement::new("late", "/media/late.jpg"));
            time::sleep(Duration::from_millis(300)).await;
            mounter.mark_loaded("late", 64);
        });

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        assert_eq!(counts, ImageCounts { loaded: 1, total: 1 });
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_partial_counts() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("pending", "/media/slow.jpg"));

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_millis(1500))
            .await;

        let elapsed = started.elapsed();
        assert_eq!(counts, ImageCounts { loaded: 0, total: 1 });
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed <= Duration::from_millis(1500 + 2 * 16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shorter_than_grace_is_honoured() {
        let document = Arc::new(DocumentImages::new());

        let started = Instant::now();
        prober_for(&document)
            .wait_for_images(&[], Duration::from_millis(1000))
            .await;

        assert!(started.elapsed() <= Duration::from_millis(1000 + 2 * 16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_count_with_broken_image_resolves_early() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("ok", "/media/ok.jpg"));
        document.insert(ImageElement::new("broken", "/media/broken.jpg"));
        document.mark_loaded("ok", 300);
        document.mark_broken("broken");

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        let elapsed = started.elapsed();
        assert_eq!(counts, ImageCounts { loaded: 1, total: 2 });
        assert!(elapsed >= Duration::from_millis(6000));
        assert!(elapsed < Duration::from_millis(6100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stability_requires_a_loaded_image() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("broken", "/media/broken.jpg"));
        document.mark_broken("broken");

        let started = Instant::now();
        let counts = prober_for(&document)
            .wait_for_images(&[], Duration::from_secs(10))
            .await;

        assert_eq!(counts, ImageCounts { loaded: 0, total: 1 });
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_selectors_limit_the_images_considered() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("hero", "/media/hero.jpg").with_class("hero"));
        document.insert(ImageElement::new("thumb", "/media/thumb.jpg"));
        document.mark_loaded("hero", 720);

        let counts = prober_for(&document)
            .wait_for_images(&[".hero".to_string()], Duration::from_secs(30))
            .await;

        assert_eq!(counts, ImageCounts { loaded: 1, total: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_signal_skips_grace_for_empty_page() {
        let document = Arc::new(DocumentImages::new());
        let registry = Arc::new(PageReadyRegistry::new());
        registry.register("about-us");
        registry.signal("about-us");

        let started = Instant::now();
        let counts = prober_for(&document)
            .with_ready_signal(Arc::clone(&registry), "about-us")
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        assert_eq!(counts, ImageCounts::default());
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_signal_needs_single_stable_window() {
        let document = Arc::new(DocumentImages::new());
        document.insert(ImageElement::new("ok", "/media/ok.jpg"));
        document.insert(ImageElement::new("broken", "/media/broken.jpg"));
        document.mark_loaded("ok", 300);
        document.mark_broken("broken");

        let registry = Arc::new(PageReadyRegistry::new());
        registry.register("complex");
        registry.signal("complex");

        let started = Instant::now();
        prober_for(&document)
            .with_ready_signal(registry, "complex")
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsignaled_registration_does_not_shortcut() {
        let document = Arc::new(DocumentImages::new());
        let registry = Arc::new(PageReadyRegistry::new());
        registry.register("home");

        let started = Instant::now();
        prober_for(&document)
            .with_ready_signal(registry, "home")
            .wait_for_images(&[], Duration::from_secs(30))
            .await;

        assert!(started.elapsed() >= Duration::from_millis(5000));
    }
}
