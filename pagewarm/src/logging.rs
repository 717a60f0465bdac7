//! Tracing subscriber setup.
//!
//! Logs go to stderr and, when a log directory is configured, to a
//! daily-rolling file written by a background worker. `RUST_LOG` always
//! takes precedence over the configured level.

use std::path::Path;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSettings;

/// Log file name prefix; files are named `pagewarm.YYYY-MM-DD.log`.
pub const LOG_FILE_PREFIX: &str = "pagewarm";

/// Filter used for `--verbose`.
pub const VERBOSE_FILTER: &str = "pagewarm=debug,info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("failed to open log directory {path}: {reason}")]
    Directory { path: String, reason: String },

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Build the level filter from `RUST_LOG`, falling back to `directive`.
pub fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(directive).map_err(|e| LoggingError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Daily-rolling log file appender in `directory`.
pub fn file_appender(directory: &Path) -> Result<RollingFileAppender, LoggingError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(directory)
        .map_err(|e| LoggingError::Directory {
            path: directory.display().to_string(),
            reason: e.to_string(),
        })
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled; keep it
/// alive for the life of the process or buffered lines are lost.
pub fn init_logging(
    settings: &LoggingSettings,
    verbose: bool,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let directive = if verbose {
        VERBOSE_FILTER
    } else {
        settings.level.as_str()
    };
    let filter = build_filter(directive)?;

    let (file_writer, guard) = match &settings.directory {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(true);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_timer(LocalTime::new(Rfc3339))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}
