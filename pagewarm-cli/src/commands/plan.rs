//! Plan command - show the tiered image plan of a strategy without loading images.

use console::style;
use pagewarm::preload::{PreloadPlan, Priority};

use super::common::{runtime, GlobalOptions, OutputFormat};
use crate::error::CliError;

/// Run the plan command.
pub fn run(options: &GlobalOptions, name: &str, format: OutputFormat) -> Result<(), CliError> {
    let config = options.load_config()?;
    let runtime = runtime()?;
    let plan = runtime.block_on(async {
        let app = options.build_app(&config)?;
        Ok::<_, CliError>(app.preload().plan_strategy(name).await?)
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

fn print_plan(plan: &PreloadPlan) {
    println!(
        "{}: {} documents, {} images",
        style(&plan.strategy).bold(),
        plan.documents,
        plan.tiers.len()
    );

    for priority in Priority::ALL {
        let urls = plan.tiers.tier(priority);
        println!();
        println!("[{}] {}", priority, urls.len());
        for url in urls {
            println!("  {}", url);
        }
    }

    if plan.tiers.dropped > 0 {
        println!();
        println!(
            "{}",
            style(format!("{} images beyond the tier budgets are skipped", plan.tiers.dropped)).dim()
        );
    }
}
