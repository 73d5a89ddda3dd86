// src/infra/config.rs - Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::errors::LocalChatError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub relay: RelayConfig,
}

/// Where chat requests go. Point `base_url` at the relay to go through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".into(),
            model: "deepseek-r1:14b".into(),
            timeout_secs: 300,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    pub dir: Option<String>,
    pub autosave_secs: u64,
    /// Largest payload the store accepts before evicting sessions.
    pub max_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            autosave_secs: 30,
            max_bytes: None,
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(dir),
            None => paths::data_dir(),
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub upstream: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            upstream: "http://127.0.0.1:11434".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, LocalChatError> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, LocalChatError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| LocalChatError::Config(format!("{}: {}", path.display(), e)))
    }
}
