//! Application error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::preload::FetchError;

/// Errors that can occur while wiring the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration file could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The content API client could not be created.
    #[error("failed to create content client: {0}")]
    Content(#[from] FetchError),

    /// The image HTTP client could not be created.
    #[error("failed to create image client: {0}")]
    ImageClient(String),
}
