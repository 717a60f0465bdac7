//! Strategies command - list registered preload strategies.

use console::style;

use super::common::{GlobalOptions, OutputFormat};
use crate::error::CliError;

/// Run the strategies command.
pub fn run(options: &GlobalOptions, format: OutputFormat) -> Result<(), CliError> {
    let config = options.load_config()?;
    let app = options.build_app(&config)?;
    let registry = app.preload().registry();

    if format == OutputFormat::Json {
        let entries: Vec<serde_json::Value> = registry
            .iter()
            .map(|strategy| {
                serde_json::json!({
                    "name": strategy.name(),
                    "description": strategy.description(),
                    "content": strategy
                        .content_keys()
                        .iter()
                        .map(|key| key.to_string())
                        .collect::<Vec<_>>(),
                    "startup": config.preload.startup_pages.iter().any(|p| p == strategy.name()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Preload Strategies");
    println!("==================");
    println!();
    for strategy in registry.iter() {
        let startup = if config.preload.startup_pages.iter().any(|p| p == strategy.name()) {
            style(" (startup)").dim().to_string()
        } else {
            String::new()
        };
        println!("  {}{}", style(strategy.name()).bold(), startup);
        println!("    {}", strategy.description());
        let keys: Vec<String> = strategy
            .content_keys()
            .iter()
            .map(|key| key.to_string())
            .collect();
        println!("    content: {}", keys.join(", "));
    }

    Ok(())
}
