//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use assetcache::cache::CacheError;
use assetcache::config::ConfigFileError;
use assetcache::error::AssetError;
use assetcache::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(String),
    /// No remote store configured for a command that fetches
    NoSource,
    /// Failed to start the runtime or the cache
    Startup(String),
    /// Asset or index fetch failed
    Asset(AssetError),
    /// Disk cache operation failed
    Cache(CacheError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::NoSource => 2,
            CliError::Asset(AssetError::NotFound { .. })
            | CliError::Asset(AssetError::UnknownCategory(_)) => 3,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::NoSource = self {
            eprintln!();
            eprintln!("Pass --source <url|dir> or set 'source' in the [remote] section");
            eprintln!("of config.ini.");
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::NoSource => write!(f, "No remote store configured"),
            CliError::Startup(msg) => write!(f, "Failed to start: {}", msg),
            CliError::Asset(e) => write!(f, "{}", e),
            CliError::Cache(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Asset(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<AssetError> for CliError {
    fn from(e: AssetError) -> Self {
        CliError::Asset(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Startup(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::NoSource.exit_code(), 2);
        assert_eq!(CliError::Config("bad".into()).exit_code(), 2);
        let missing = CliError::from(AssetError::NotFound { path: "p".into() });
        assert_eq!(missing.exit_code(), 3);
        assert_eq!(CliError::from(AssetError::Cancelled).exit_code(), 1);
    }
}
