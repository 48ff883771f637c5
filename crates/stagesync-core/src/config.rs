//! Sync configuration management.
//!
//! Holds the mirror list, the client selector and the timeouts used by the
//! orchestrator, plus the locations of the cache, resource and log
//! directories.
//!
//! Configuration is stored at `~/.config/stagesync/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "stagesync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Body cache directory under the cache root
const BODY_CACHE_DIR: &str = "resource-cache";

/// Validator store file under the cache root
const VALIDATORS_FILE: &str = "validators.json";

/// Mirrors in priority order. Both host identical documents.
pub const DEFAULT_MIRRORS: [&str; 2] = [
    "https://api.maa.plus/MaaAssistantArknights/api/",
    "https://api2.maa.plus/MaaAssistantArknights/api/",
];

/// Transport-level request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Upper bound for one mirror attempt, body read included.
/// Keeps a slow mirror from starving the next one or the cached copy.
pub(crate) const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 20;

const ENV_MIRRORS: &str = "STAGESYNC_MIRRORS";
const ENV_CLIENT: &str = "STAGESYNC_CLIENT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mirrors: Vec<String>,
    pub client_type: String,
    /// Version of the automation engine, used for minimum-version gates
    pub core_version: Option<String>,
    pub request_timeout_secs: u64,
    pub attempt_timeout_secs: u64,
    pub cache_dir: Option<PathBuf>,
    /// Directory holding the engine's bundled resources (item_index.json)
    pub resource_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            client_type: "Official".to_string(),
            core_version: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT_SECS,
            cache_dir: None,
            resource_dir: None,
            log_dir: None,
        }
    }
}

impl SyncConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `STAGESYNC_MIRRORS` (comma separated) and `STAGESYNC_CLIENT`
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_MIRRORS).ok().as_deref(),
            std::env::var(ENV_CLIENT).ok().as_deref(),
        );
    }

    fn apply_overrides(&mut self, mirrors: Option<&str>, client: Option<&str>) {
        if let Some(mirrors) = mirrors {
            let parsed: Vec<String> = mirrors
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            if !parsed.is_empty() {
                self.mirrors = parsed;
            }
        }
        if let Some(client) = client {
            self.client_type = client.trim().to_string();
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Root of the per-key document files
    pub fn body_cache_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(BODY_CACHE_DIR))
    }

    pub fn validators_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(VALIDATORS_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}
