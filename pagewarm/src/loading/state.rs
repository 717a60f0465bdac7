//! Published page loading state.

use serde::Serialize;

/// Lifecycle phase of a page load.
///
/// ```text
/// Idle ──start──> Loading ──> Loaded
///                    │   └──> Errored
///   Loaded/Errored ──start──> Loading
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Progress counters for the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadingProgress {
    pub apis_completed: usize,
    pub apis_total: usize,
    pub images_loaded: usize,
    pub images_total: usize,
}

impl LoadingProgress {
    /// Fraction of tracked work finished, in `0.0..=1.0`.
    ///
    /// API calls and images weigh equally; with nothing to track the load
    /// counts as finished.
    pub fn ratio(&self) -> f64 {
        let total = self.apis_total + self.images_total;
        if total == 0 {
            return 1.0;
        }
        (self.apis_completed + self.images_loaded) as f64 / total as f64
    }
}

/// Snapshot of a page's loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadingState {
    pub phase: LoadingPhase,
    pub is_loading: bool,
    pub has_error: bool,
    pub progress: LoadingProgress,
}

impl LoadingState {
    /// State published when a load begins.
    pub(crate) fn loading(apis_total: usize) -> Self {
        Self {
            phase: LoadingPhase::Loading,
            is_loading: true,
            has_error: false,
            progress: LoadingProgress {
                apis_total,
                ..LoadingProgress::default()
            },
        }
    }

    pub(crate) fn finish(&mut self) {
        self.phase = LoadingPhase::Loaded;
        self.is_loading = false;
        self.has_error = false;
    }

    pub(crate) fn fail(&mut self) {
        self.phase = LoadingPhase::Errored;
        self.is_loading = false;
        self.has_error = true;
    }
}
