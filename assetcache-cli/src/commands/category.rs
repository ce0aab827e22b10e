//! Category and index commands.

use crate::error::CliError;
use crate::runner::CliRunner;

/// Load every model of a category and report failures.
pub fn load(runner: &CliRunner, name: &str) -> Result<(), CliError> {
    let cache = runner.start_cache()?;
    let result = runner.block_on(cache.load_category(name));
    let stats = cache.stats();
    runner.block_on(cache.close());

    let report = result?;
    println!(
        "Loaded {} of {} models in '{}'",
        report.succeeded().len(),
        report.len(),
        name
    );
    for (key, error) in report.failed() {
        println!("  {}: {}", key, error);
    }
    println!();
    println!("{}", stats.format());
    Ok(())
}

/// Download the resource index and print it.
pub fn index(runner: &CliRunner) -> Result<(), CliError> {
    let cache = runner.start_cache()?;
    let result = runner.block_on(cache.load_index());
    runner.block_on(cache.close());

    let index = result?;
    for category in index.categories() {
        println!("{}", category);
        for subcategory in index.subcategories(category) {
            let models = index.models(category, subcategory);
            println!("  {} ({} models)", subcategory, models.len());
        }
    }

    let colors = index.colors();
    if !colors.is_empty() {
        let hex: Vec<String> = colors.iter().map(|c| c.to_string()).collect();
        println!();
        println!("Colors: {}", hex.join(" "));
    }
    Ok(())
}
