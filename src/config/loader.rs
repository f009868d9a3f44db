//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::download::DEFAULT_CONCURRENT_DOWNLOADS;
use crate::error::{Error, Result};
use crate::fs::paths::DEFAULT_DOWNLOADS_DIR;
use crate::media::GROUP_SEARCH_RADIUS;
use crate::run::RunOptions;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

/// Storage locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-run download folders.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,
}

/// Download behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Width of the download worker pool.
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    /// Half-width of the id window searched when resolving albums.
    #[serde(default = "default_group_search_radius")]
    pub group_search_radius: i64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrent_downloads: default_concurrent_downloads(),
            group_search_radius: default_group_search_radius(),
        }
    }
}

fn default_concurrent_downloads() -> usize {
    DEFAULT_CONCURRENT_DOWNLOADS
}

fn default_group_search_radius() -> i64 {
    GROUP_SEARCH_RADIUS
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective downloads root.
    pub fn downloads_root(&self) -> PathBuf {
        self.storage
            .download_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_DIR))
    }

    /// Collapse the configuration into the run's ambient options.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            downloads_root: self.downloads_root(),
            concurrent_downloads: self.download.concurrent_downloads,
            group_search_radius: self.download.group_search_radius,
        }
    }
}
