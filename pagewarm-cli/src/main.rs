//! Pagewarm CLI - Command-line interface
//!
//! Inspects and runs the preload strategies of a site from the terminal.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use pagewarm::logging::init_logging;
use tracing::debug;

use commands::common::{GlobalOptions, OutputFormat};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "pagewarm", version, about = "Prioritized page-content and image preloading")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Content API base URL, overriding api.base_url
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the registered preload strategies
    Strategies {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Run preload strategies (defaults to preload.startup_pages)
    Preload {
        /// Strategy names, e.g. home about-us
        names: Vec<String>,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Fetch a strategy's content and show its tiered image plan
    Plan {
        /// Strategy name
        name: String,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = GlobalOptions {
        config_path: cli.config,
        api_url: cli.api_url,
        verbose: cli.verbose,
    };

    match cli.command {
        // Config commands run without logging.
        Commands::Config(command) => commands::config::run(&options, command),
        Commands::Strategies { format } => {
            let _guard = start_logging(&options)?;
            commands::strategies::run(&options, format)
        }
        Commands::Preload { names, format } => {
            let _guard = start_logging(&options)?;
            commands::preload::run(&options, names, format)
        }
        Commands::Plan { name, format } => {
            let _guard = start_logging(&options)?;
            commands::plan::run(&options, &name, format)
        }
    }
}

/// Install logging from the loaded configuration.
///
/// The returned guard flushes the log file when dropped; hold it until the
/// command finishes.
fn start_logging(options: &GlobalOptions) -> Result<impl Sized, CliError> {
    let config = options.load_config()?;
    let guard = init_logging(&config.logging, options.verbose)?;
    debug!(config = %options.config_path().display(), "Configuration loaded");
    Ok(guard)
}
