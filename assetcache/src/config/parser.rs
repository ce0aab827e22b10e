//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache]
    if let Some(section) = ini.section(Some("cache")) {
        let s = Section::new("cache", section);
        if let Some(v) = s.non_empty("directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = s.size("disk_size")? {
            config.cache.disk_size = v;
        }
        if let Some(v) = s.number("maintenance_interval")? {
            config.cache.maintenance_interval_secs = v;
        }
        if let Some(v) = s.number("model_memory_entries")? {
            config.cache.model_memory_entries = v;
        }
        if let Some(v) = s.number("thumbnail_memory_entries")? {
            config.cache.thumbnail_memory_entries = v;
        }
    }

    // [remote]
    if let Some(section) = ini.section(Some("remote")) {
        let s = Section::new("remote", section);
        if let Some(v) = s.non_empty("source") {
            config.remote.source = Some(v.to_string());
        }
        if let Some(v) = s.non_empty("root") {
            config.remote.root = v.trim_matches('/').to_string();
        }
        if let Some(v) = s.positive("timeout")? {
            config.remote.timeout_secs = v;
        }
        if let Some(v) = s.size("model_max_size")? {
            config.remote.model_max_size = v;
        }
        if let Some(v) = s.size("thumbnail_max_size")? {
            config.remote.thumbnail_max_size = v;
        }
        if let Some(v) = s.size("index_max_size")? {
            config.remote.index_max_size = v;
        }
    }

    // [loader]
    if let Some(section) = ini.section(Some("loader")) {
        let s = Section::new("loader", section);
        if let Some(v) = s.positive("batch_concurrency")? {
            config.loader.batch_concurrency = v;
        }
        if let Some(v) = s.number("sync_timeout_ms")? {
            config.loader.sync_timeout_ms = v;
        }
        if let Some(v) = s.positive("thumbnail_size")? {
            config.loader.thumbnail_size = v;
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        if let Some(v) = s.non_empty("directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = s.non_empty("file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

/// One INI section with typed getters that report the offending key.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn non_empty(&self, key: &str) -> Option<&'a str> {
        self.props
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn size(&self, key: &str) -> Result<Option<u64>, ConfigFileError> {
        self.non_empty(key)
            .map(|v| {
                parse_size(v)
                    .map_err(|_| self.invalid(key, v, "expected format like '100MB', '1GB', or '512KB'"))
            })
            .transpose()
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigFileError> {
        self.non_empty(key)
            .map(|v| v.parse().map_err(|_| self.invalid(key, v, "expected a whole number")))
            .transpose()
    }

    fn positive<T: FromStr + Default + PartialEq>(&self, key: &str) -> Result<Option<T>, ConfigFileError> {
        match self.number::<T>(key)? {
            Some(v) if v == T::default() => {
                let raw = self.non_empty(key).unwrap_or_default();
                Err(self.invalid(key, raw, "must be greater than zero"))
            }
            other => Ok(other),
        }
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_all_sections() {
        let config = parse(
            r#"
[cache]
directory = /var/cache/assets
disk_size = 250MB
maintenance_interval = 3600
model_memory_entries = 10
thumbnail_memory_entries = 20

[remote]
source = https://assets.example.com
root = /custom_root/
timeout = 5
model_max_size = 20MB
thumbnail_max_size = 512KB
index_max_size = 64KB

[loader]
batch_concurrency = 6
sync_timeout_ms = 750
thumbnail_size = 128

[logging]
directory = /var/log/assetcache
file = cache.log
"#,
        )
        .unwrap();

        assert_eq!(config.cache.directory, PathBuf::from("/var/cache/assets"));
        assert_eq!(config.cache.disk_size, 250 * 1024 * 1024);
        assert_eq!(config.cache.maintenance_interval_secs, 3600);
        assert_eq!(config.cache.model_memory_entries, 10);
        assert_eq!(config.cache.thumbnail_memory_entries, 20);
        assert_eq!(config.remote.source.as_deref(), Some("https://assets.example.com"));
        assert_eq!(config.remote.root, "custom_root");
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.remote.model_max_size, 20 * 1024 * 1024);
        assert_eq!(config.remote.thumbnail_max_size, 512 * 1024);
        assert_eq!(config.remote.index_max_size, 64 * 1024);
        assert_eq!(config.loader.batch_concurrency, 6);
        assert_eq!(config.loader.sync_timeout_ms, 750);
        assert_eq!(config.loader.thumbnail_size, 128);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/assetcache"));
        assert_eq!(config.logging.file, "cache.log");
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[cache]\ndisk_size =\n[remote]\nsource =\n").unwrap();
        assert_eq!(config.cache.disk_size, DEFAULT_DISK_BUDGET);
        assert!(config.remote.source.is_none());
    }

    #[test]
    fn test_invalid_size() {
        let err = parse("[cache]\ndisk_size = lots\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "cache");
                assert_eq!(key, "disk_size");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = parse("[loader]\nbatch_concurrency = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { key, .. } if key == "batch_concurrency"));
    }

    #[test]
    fn test_invalid_number() {
        assert!(parse("[loader]\nsync_timeout_ms = soon\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/cache"), home.join("cache"));
        }
    }
}
