//! Timing configuration for the image readiness prober.

use std::time::Duration;

/// Default polling period, one display frame at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Default time to keep polling while no images exist yet.
///
/// Pages often mount their image-bearing children after the first render.
pub const DEFAULT_NO_IMAGE_GRACE_MS: u64 = 5000;

/// Default length of one image-count stability window.
pub const DEFAULT_STABILITY_WINDOW_MS: u64 = 2000;

/// Default number of consecutive unchanged windows before resolving early.
pub const DEFAULT_STABLE_WINDOWS_REQUIRED: u32 = 3;

/// Timing configuration for [`ImageReadinessProber`](super::ImageReadinessProber).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Period between two queries of the image source.
    pub frame_interval: Duration,

    /// How long zero matching images are treated as "not mounted yet".
    pub no_image_grace: Duration,

    /// Length of one window of the image-count stability check.
    pub stability_window: Duration,

    /// Consecutive windows with an unchanged image count needed to resolve
    /// early, provided at least one image has loaded.
    pub stable_windows_required: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            no_image_grace: Duration::from_millis(DEFAULT_NO_IMAGE_GRACE_MS),
            stability_window: Duration::from_millis(DEFAULT_STABILITY_WINDOW_MS),
            stable_windows_required: DEFAULT_STABLE_WINDOWS_REQUIRED,
        }
    }
}

impl ReadinessConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling period. Zero is raised to one millisecond.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the zero-image grace period.
    pub fn with_no_image_grace(mut self, grace: Duration) -> Self {
        self.no_image_grace = grace;
        self
    }

    /// Set the stability window length and required window count.
    pub fn with_stability(mut self, window: Duration, windows_required: u32) -> Self {
        self.stability_window = window;
        self.stable_windows_required = windows_required.max(1);
        self
    }
}
