//! Error types for preloading.

use std::sync::Arc;

use thiserror::Error;

use super::content::ContentKey;

/// Failure to fetch page content JSON.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The content endpoint URL could not be formed.
    #[error("invalid content URL for {key}: {reason}")]
    InvalidUrl { key: String, reason: String },

    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body was not valid JSON.
    #[error("invalid JSON from {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Failure to load a single image.
///
/// Never surfaced to callers of the preload manager; an image that fails
/// simply counts as not loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageLoadError {
    #[error("invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Failure of a whole preload strategy.
#[derive(Debug, Error)]
pub enum PreloadError {
    /// No strategy is registered under this name.
    #[error("unknown preload strategy '{0}'")]
    UnknownStrategy(String),

    /// The strategy's primary content could not be fetched.
    #[error("failed to fetch {key}: {source}")]
    Content {
        key: ContentKey,
        #[source]
        source: Arc<FetchError>,
    },

    /// The strategy panicked.
    #[error("preload strategy '{0}' panicked")]
    Panicked(String),
}
