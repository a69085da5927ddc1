//! Configuration types and loading

use crate::backend::{Backend, FileBackend, SqliteBackend};
use crate::filter::UndatedPlacement;
use crate::persist::DEFAULT_KEY;
use crate::record::{DEFAULT_CATEGORY, Priority};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where tasks are persisted
    pub storage: StorageConfig,

    /// Defaults applied to new tasks
    pub defaults: DefaultsConfig,

    /// View ordering
    pub view: ViewConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .tasklist.yml
        let local_config = PathBuf::from(".tasklist.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/tasklist/tasklist.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tasklist").join("tasklist.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind: file or sqlite
    pub backend: BackendKind,

    /// Directory holding the backend's files
    pub dir: PathBuf,

    /// Slot name for the task array
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            dir: default_store_dir(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    /// Open the configured backend, creating its directory if needed
    pub fn open_backend(&self) -> Result<Box<dyn Backend>> {
        let backend: Box<dyn Backend> = match self.backend {
            BackendKind::File => Box::new(
                FileBackend::open(&self.dir).context(format!("Failed to open store at {}", self.dir.display()))?,
            ),
            BackendKind::Sqlite => Box::new(
                SqliteBackend::open(&self.dir)
                    .context(format!("Failed to open SQLite store at {}", self.dir.display()))?,
            ),
        };
        Ok(backend)
    }
}

fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasklist")
}

/// Defaults for new tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub priority: Priority,
    pub category: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            priority: Priority::default(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// View configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Where undated tasks sort within a priority: first or last
    pub undated: UndatedPlacement,
}
