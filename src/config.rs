//! Persistent configuration model and defaults.

use std::path::{Path, PathBuf};

use log::info;

use crate::db_manager::StoreLocation;
use crate::error::Result;

/// Root configuration persisted to `playlist-store.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    /// Database files and their names.
    pub storage: StorageConfig,
    #[serde(default)]
    /// Terminal logging preferences.
    pub logging: LoggingConfig,
}

/// Where and how playlist databases are stored.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StorageConfig {
    /// Directory holding the database files. Empty means the platform data dir.
    #[serde(default)]
    pub data_dir: String,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// Pre-consolidation database holding the old playlist-name list.
    #[serde(default = "default_legacy_database_name")]
    pub legacy_database_name: String,
    /// Expected database size in bytes, recorded with each database.
    #[serde(default = "default_size_hint")]
    pub size_hint: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_database_name() -> String {
    "music-app-playlist".to_string()
}

fn default_legacy_database_name() -> String {
    "music-app-playlists".to_string()
}

fn default_size_hint() -> u64 {
    1_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            database_name: default_database_name(),
            legacy_database_name: default_legacy_database_name(),
            size_hint: default_size_hint(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StorageConfig {
    /// Resolved database location, falling back to `<data dir>/playlist-store`.
    pub fn location(&self) -> StoreLocation {
        if !self.data_dir.is_empty() {
            return StoreLocation::Directory(PathBuf::from(&self.data_dir));
        }
        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("playlist-store");
        StoreLocation::Directory(data_dir)
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("playlist-store.toml")
}

/// Reads `path`, writing the defaults there first when it does not exist.
pub fn load_or_create(path: &Path) -> Result<StoreConfig> {
    if !path.exists() {
        let default_config = StoreConfig::default();
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&default_config)?;
        std::fs::write(path, content)?;
        return Ok(default_config);
    }

    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<StoreConfig>(&content)?)
}
