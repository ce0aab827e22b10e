//! assetcache CLI - Command-line interface
//!
//! Fetches avatar assets through the cache and manages the on-disk cache.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{asset, cache, category};
use crate::runner::CliRunner;

#[derive(Parser)]
#[command(name = "assetcache")]
#[command(version = assetcache::VERSION)]
#[command(about = "Fetch and cache remote avatar assets", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/assetcache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Remote store: an http(s) base URL or a local mirror directory
    #[arg(long, global = true)]
    source: Option<String>,

    /// Disk cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a model package and print its size
    Model {
        /// Asset name, e.g. tops_blue_01
        name: String,
    },
    /// Fetch a thumbnail at the configured preview size
    Thumbnail {
        /// Asset name, e.g. tops_blue_01
        name: String,

        /// Write the preview as PNG to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load every model of a category
    Category {
        /// Category name, e.g. clothes
        name: String,
    },
    /// Download and print the resource index
    Index,
    /// Remove every cached asset from disk
    Clear,
    /// Evict the oldest disk entries until the cache fits its budget
    Evict,
    /// Show disk cache usage
    Stats,
}

fn main() {
    let cli = Cli::parse();

    let result = CliRunner::new(cli.config.as_deref(), cli.source, cli.cache_dir).and_then(
        |runner| match cli.command {
            Commands::Model { name } => asset::model(&runner, &name),
            Commands::Thumbnail { name, output } => {
                asset::thumbnail(&runner, &name, output.as_deref())
            }
            Commands::Category { name } => category::load(&runner, &name),
            Commands::Index => category::index(&runner),
            Commands::Clear => cache::clear(&runner),
            Commands::Evict => cache::evict(&runner),
            Commands::Stats => cache::stats(&runner),
        },
    );

    if let Err(e) = result {
        e.exit();
    }
}
