//! Generation-stamped page loading controller.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::state::{LoadingPhase, LoadingState};
use crate::readiness::ImageReadinessProber;

/// Default upper bound on the image phase of a page load in milliseconds.
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 30_000;

/// Configuration for a [`PageLoadingController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingConfig {
    /// Selectors of the images that gate readiness. Empty means every image.
    pub selectors: Vec<String>,

    /// Upper bound on the image phase.
    pub image_timeout: Duration,

    /// Page identifier, used in diagnostics.
    pub page_id: Option<String>,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            selectors: vec!["img".to_string()],
            image_timeout: Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS),
            page_id: None,
        }
    }
}

impl LoadingConfig {
    /// Configuration for a named page.
    pub fn for_page(page_id: impl Into<String>) -> Self {
        Self {
            page_id: Some(page_id.into()),
            ..Self::default()
        }
    }
}

/// Decides when a page is ready to show.
///
/// Each [`start`](Self::start) waits for its API calls to settle, then for
/// the page's images, and publishes the result. Calls may overlap: every
/// call stamps a new generation, and only the call holding the current
/// generation may publish. Earlier calls run to their next check point and
/// then stop without touching the state, so the visible state always belongs
/// to the most recent call.
///
/// Clones share generation counter, state and cancellation.
///
/// # Example
///
/// ```ignore
/// let controller = PageLoadingController::new(prober, LoadingConfig::for_page("home"));
/// let mut state_rx = controller.subscribe();
///
/// controller.start(vec![fetch_home().boxed(), fetch_footer().boxed()]).await;
///
/// assert!(!state_rx.borrow_and_update().is_loading);
/// ```
#[derive(Debug, Clone)]
pub struct PageLoadingController {
    prober: ImageReadinessProber,
    config: LoadingConfig,
    generation: Arc<AtomicU64>,
    state_tx: Arc<watch::Sender<LoadingState>>,
    cancellation: CancellationToken,
}

impl PageLoadingController {
    /// Create an idle controller.
    pub fn new(prober: ImageReadinessProber, config: LoadingConfig) -> Self {
        let (state_tx, _) = watch::channel(LoadingState::default());
        Self {
            prober,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            state_tx: Arc::new(state_tx),
            cancellation: CancellationToken::new(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LoadingConfig {
        &self.config
    }

    /// Current state snapshot.
    pub fn state(&self) -> LoadingState {
        *self.state_tx.borrow()
    }

    /// Receive every published state change.
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.state_tx.subscribe()
    }

    /// Whether the most recent load reached `Loaded` or `Errored`.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.state().phase,
            LoadingPhase::Loaded | LoadingPhase::Errored
        )
    }

    /// Current generation. Increases by one per `start` and on `dispose`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Load the page: settle `api_calls`, then wait for images.
    ///
    /// A failing or panicking API call does not fail the load; it still
    /// counts towards `apis_completed`. Only a panic in the load itself
    /// publishes `has_error`.
    pub async fn start<I, F, T, E>(&self, api_calls: I)
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_disposed() {
            debug!(page_id = self.page_id(), "Ignoring start on disposed controller");
            return;
        }

        let api_calls: Vec<F> = api_calls.into_iter().collect();
        let apis_total = api_calls.len();
        self.commit(generation, |state| *state = LoadingState::loading(apis_total));
        info!(
            page_id = self.page_id(),
            generation, apis_total, "Page load started"
        );

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                debug!(page_id = self.page_id(), generation, "Page load abandoned on dispose");
            }
            _ = self.run(generation, api_calls) => {}
        }
    }

    /// Stop all in-flight loads; no further state is published.
    pub fn dispose(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancellation.cancel();
    }

    async fn run<F, T, E>(&self, generation: u64, api_calls: Vec<F>)
    where
        F: Future<Output = Result<T, E>>,
    {
        let outcome = AssertUnwindSafe(self.load(generation, api_calls))
            .catch_unwind()
            .await;

        if outcome.is_err() && self.commit(generation, LoadingState::fail) {
            error!(page_id = self.page_id(), generation, "Page load failed");
        }
    }

    async fn load<F, T, E>(&self, generation: u64, api_calls: Vec<F>)
    where
        F: Future<Output = Result<T, E>>,
    {
        if !api_calls.is_empty() {
            let settled = join_all(
                api_calls
                    .into_iter()
                    .map(|call| AssertUnwindSafe(call).catch_unwind()),
            )
            .await;

            if !self.is_current(generation) {
                debug!(page_id = self.page_id(), generation, "Superseded after API phase");
                return;
            }

            let rejected = settled
                .iter()
                .filter(|outcome| !matches!(outcome, Ok(Ok(_))))
                .count();
            if rejected > 0 {
                warn!(
                    page_id = self.page_id(),
                    rejected,
                    total = settled.len(),
                    "Some page API calls failed"
                );
            }

            let apis_completed = settled.len();
            self.commit(generation, |state| {
                state.progress.apis_completed = apis_completed;
            });
        }

        let counts = self
            .prober
            .wait_for_images(&self.config.selectors, self.config.image_timeout)
            .await;

        if !self.is_current(generation) {
            debug!(page_id = self.page_id(), generation, "Superseded after image phase");
            return;
        }

        let committed = self.commit(generation, |state| {
            state.progress.images_loaded = counts.loaded;
            state.progress.images_total = counts.total;
            state.finish();
        });
        if committed {
            info!(
                page_id = self.page_id(),
                generation,
                images_loaded = counts.loaded,
                images_total = counts.total,
                "Page ready"
            );
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `update` if `generation` is still current.
    ///
    /// The generation is re-checked under the channel's write lock, so a
    /// newer `start` always publishes after any commit of an older one.
    fn commit(&self, generation: u64, update: impl FnOnce(&mut LoadingState)) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.is_current(generation) {
                update(state);
                true
            } else {
                false
            }
        })
    }

    fn page_id(&self) -> &str {
        self.config.page_id.as_deref().unwrap_or("-")
    }
}
