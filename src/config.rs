//! Client settings persisted as `config.toml` in the app directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::listing::OpenDonePager;
use crate::mes::RuntimeOptions;

/// Default filename used to store the client configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable that overrides `api.base_url`.
pub const API_BASE_ENV: &str = "MOULDTRACK_API_BASE";

const MIN_TICK_INTERVAL_MS: u64 = 20;
const MIN_SYNC_INTERVAL_SECS: u64 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sync_interval_secs: default_sync_interval_secs(),
        }
    }
}

impl PanelSettings {
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            sync_interval: Duration::from_secs(self.sync_interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_done_first_page")]
    pub done_first_page: usize,
    #[serde(default = "default_done_page_size")]
    pub done_page_size: usize,
    /// Overrides every collection's own default `limit` when set.
    #[serde(default)]
    pub default_limit: Option<u32>,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            done_first_page: default_done_first_page(),
            done_page_size: default_done_page_size(),
            default_limit: None,
        }
    }
}

impl ListingSettings {
    pub fn open_done_pager(&self) -> OpenDonePager {
        OpenDonePager {
            first_page_done: self.done_first_page,
            page_size: self.done_page_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub panel: PanelSettings,
    #[serde(default)]
    pub listing: ListingSettings,
}

impl AppConfig {
    /// Clamp values that would make the client misbehave.
    pub fn normalized(mut self) -> Self {
        self.api.base_url = self.api.base_url.trim().to_string();
        if self.api.base_url.is_empty() {
            self.api.base_url = default_base_url();
        }
        self.panel.tick_interval_ms = self.panel.tick_interval_ms.max(MIN_TICK_INTERVAL_MS);
        self.panel.sync_interval_secs = self.panel.sync_interval_secs.max(MIN_SYNC_INTERVAL_SECS);
        self.listing.page_size = self.listing.page_size.max(1);
        self.listing.done_page_size = self.listing.done_page_size.max(1);
        self
    }

    /// Apply environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(API_BASE_ENV)
            && !base_url.trim().is_empty()
        {
            self.api.base_url = base_url.trim().to_string();
        }
        self
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tick_interval_ms() -> u64 {
    200
}

fn default_sync_interval_secs() -> u64 {
    10 * 60
}

fn default_page_size() -> usize {
    8
}

fn default_done_first_page() -> usize {
    10
}

fn default_done_page_size() -> usize {
    20
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk with environment overrides, returning
/// defaults if the file is missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let path = config_path()?;
    Ok(load_from(&path)?.with_env_overrides())
}

/// Persist configuration, overwriting any previous contents.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_to_path(config, &path)
}

pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<AppConfig>(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(AppConfig::normalized)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}
