//! Disk cache management commands.
//!
//! These work on the cache directory directly and need no remote store.

use assetcache::asset::AssetKind;
use assetcache::cache::DiskCache;
use assetcache::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

fn disk_cache(runner: &CliRunner) -> DiskCache {
    DiskCache::new(runner.cache_config().cache_dir())
}

/// Clear the disk cache, removing all cached assets.
pub fn clear(runner: &CliRunner) -> Result<(), CliError> {
    let disk = disk_cache(runner);
    println!("Clearing disk cache at: {}", disk.root().display());

    let freed = runner.block_on(async {
        let size = disk.size_of().await?;
        disk.clear().await?;
        Ok::<_, CliError>(size)
    })?;
    println!("Freed {}", format_size(freed));
    Ok(())
}

/// Evict the oldest entries until the cache fits its budget.
pub fn evict(runner: &CliRunner) -> Result<(), CliError> {
    let disk = disk_cache(runner);
    let budget = runner.cache_config().disk_budget();
    println!(
        "Evicting {} to {}",
        disk.root().display(),
        format_size(budget)
    );

    let result = runner.block_on(disk.evict_to_budget(budget))?;
    if result.evicted() {
        println!(
            "Deleted {} files, freed {} ({} -> {})",
            result.files_deleted,
            format_size(result.bytes_freed),
            format_size(result.size_before),
            format_size(result.size_after)
        );
    } else {
        println!("Within budget ({}), nothing to evict", format_size(result.size_before));
    }
    Ok(())
}

/// Show disk cache usage per asset kind.
pub fn stats(runner: &CliRunner) -> Result<(), CliError> {
    let disk = disk_cache(runner);
    let entries = runner.block_on(disk.entries())?;

    println!("Disk cache: {}", disk.root().display());
    for kind in AssetKind::ALL {
        let dir = disk.root().join(kind.directory());
        let (files, bytes) = entries
            .iter()
            .filter(|entry| entry.path.starts_with(&dir))
            .fold((0usize, 0u64), |(files, bytes), entry| {
                (files + 1, bytes + entry.size)
            });
        println!("  {:<11} {:>6} files  {}", kind.directory(), files, format_size(bytes));
    }

    let total: u64 = entries.iter().map(|entry| entry.size).sum();
    println!(
        "  Total: {} of {} budget",
        format_size(total),
        format_size(runner.cache_config().disk_budget())
    );
    Ok(())
}
