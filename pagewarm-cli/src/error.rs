//! CLI error type.

use std::fmt;

use pagewarm::app::AppError;
use pagewarm::config::ConfigError;
use pagewarm::logging::LoggingError;
use pagewarm::preload::PreloadError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad configuration or configuration key.
    Config(String),

    /// The application could not be wired.
    App(AppError),

    /// A preload strategy failed.
    Preload(PreloadError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// The async runtime could not be created.
    Runtime(String),

    /// Output could not be serialized.
    Output(String),

    /// Some strategies failed; the count is reported.
    StrategiesFailed(usize),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Preload(e) => write!(f, "Preload failed: {}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::StrategiesFailed(count) => {
                write!(f, "{} preload strateg{} failed", count, if *count == 1 { "y" } else { "ies" })
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Preload(e) => Some(e),
            CliError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<PreloadError> for CliError {
    fn from(e: PreloadError) -> Self {
        CliError::Preload(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
