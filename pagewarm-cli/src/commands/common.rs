//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use console::style;
use pagewarm::app::{App, AppConfig};
use pagewarm::config::{config_file_path, ConfigFile};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// Output format for commands that report results.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub verbose: bool,
}

impl GlobalOptions {
    /// The configuration file in use.
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config_file_path)
    }

    /// Load the configuration file; a missing file yields defaults.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        load_config_from(&self.config_path())
    }

    /// Build the application, applying `--api-url` over the file.
    pub fn build_app(&self, config: &ConfigFile) -> Result<App, CliError> {
        let mut app_config = AppConfig::from_config_file(config);
        if let Some(url) = &self.api_url {
            app_config = app_config.with_api_base_url(url.clone());
        }
        Ok(App::new(app_config)?)
    }
}

/// Load `path`, or defaults when it does not exist.
pub fn load_config_from(path: &Path) -> Result<ConfigFile, CliError> {
    if path.exists() {
        Ok(ConfigFile::load_from(path)?)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Runtime for commands that do network work.
pub fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}

/// Green check mark.
pub fn ok_mark() -> console::StyledObject<&'static str> {
    style("✓").green()
}

/// Red cross.
pub fn fail_mark() -> console::StyledObject<&'static str> {
    style("✗").red()
}
