//! Configuration: runtime settings, `config.ini` loading, and size parsing.
//!
//! # Example
//!
//! ```
//! use assetcache::config::{AssetCacheConfig, ConfigFile};
//!
//! // Defaults
//! let config = AssetCacheConfig::default();
//! assert_eq!(config.thumbnail_size(), 200);
//!
//! // From the [cache], [remote], [loader] sections of a config file
//! let config = ConfigFile::default().to_cache_config();
//! assert_eq!(config.remote_root(), "avatar_assets");
//! ```

mod cache;
mod defaults;
mod file;
mod parser;
mod settings;
mod size;

pub use cache::AssetCacheConfig;
pub use defaults::*;
pub use file::{config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoaderSettings, LoggingSettings, RemoteSettings};
pub use size::{format_size, parse_size, SizeParseError};
