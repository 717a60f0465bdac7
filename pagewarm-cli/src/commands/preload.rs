//! Preload command - run strategies and report what they loaded.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pagewarm::preload::{PreloadError, PreloadReport};

use super::common::{fail_mark, ok_mark, runtime, GlobalOptions, OutputFormat};
use crate::error::CliError;

/// Run the preload command.
///
/// With no names the configured startup pages are warmed.
pub fn run(
    options: &GlobalOptions,
    names: Vec<String>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = options.load_config()?;
    let names = if names.is_empty() {
        config.preload.startup_pages.clone()
    } else {
        names
    };
    if names.is_empty() {
        return Err(CliError::Config(
            "no strategies given and preload.startup_pages is empty".to_string(),
        ));
    }

    let runtime = runtime()?;
    let outcomes = runtime.block_on(async {
        let app = options.build_app(&config)?;

        let spinner = (format == OutputFormat::Text).then(|| progress_spinner(&names));
        let outcomes = app.preload().run_strategies(&names).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        Ok::<_, CliError>(outcomes)
    })?;

    let failed = outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count();

    match format {
        OutputFormat::Json => print_json(&outcomes)?,
        OutputFormat::Text => print_text(&outcomes),
    }

    if failed > 0 {
        Err(CliError::StrategiesFailed(failed))
    } else {
        Ok(())
    }
}

fn progress_spinner(names: &[String]) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(format!("Preloading {}", names.join(", ")));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_text(outcomes: &[(String, Result<PreloadReport, PreloadError>)]) {
    for (name, outcome) in outcomes {
        match outcome {
            Ok(report) => println!("{} {}", ok_mark(), report),
            Err(e) => println!("{} {}: {}", fail_mark(), style(name).bold(), e),
        }
    }
}

fn print_json(outcomes: &[(String, Result<PreloadReport, PreloadError>)]) -> Result<(), CliError> {
    let entries: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|(name, outcome)| match outcome {
            Ok(report) => serde_json::json!({ "strategy": name, "ok": true, "report": report }),
            Err(e) => serde_json::json!({ "strategy": name, "ok": false, "error": e.to_string() }),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
