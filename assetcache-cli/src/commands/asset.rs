//! Single asset commands.

use std::path::Path;

use assetcache::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Fetch a model and print what was loaded.
pub fn model(runner: &CliRunner, name: &str) -> Result<(), CliError> {
    let cache = runner.start_cache()?;
    let result = runner.block_on(cache.get_model(name));
    runner.block_on(cache.close());

    let model = result?;
    println!("{}: {}", model.name(), format_size(model.size_bytes() as u64));
    Ok(())
}

/// Fetch a thumbnail, optionally saving it as PNG.
pub fn thumbnail(runner: &CliRunner, name: &str, output: Option<&Path>) -> Result<(), CliError> {
    let cache = runner.start_cache()?;
    let result = runner.block_on(cache.get_thumbnail(name));
    runner.block_on(cache.close());

    let thumbnail = result?;
    println!(
        "{}: {}x{}",
        thumbnail.name(),
        thumbnail.width(),
        thumbnail.height()
    );

    if let Some(path) = output {
        let png = thumbnail.to_png()?;
        std::fs::write(path, png).map_err(|error| CliError::FileWrite {
            path: path.to_path_buf(),
            error,
        })?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}
