//! Configuration management for Trawl.
//!
//! Configuration is stored in TOML format in a platform-appropriate location.
//! Every section falls back to defaults, so a partial file is valid.

use crate::error::{Result, TrawlError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Trawl.
///
/// ## Example Configuration File (trawl.toml)
///
/// ```toml
/// [general]
/// auto_save_index = true
/// log_level = "info"
///
/// [search]
/// large_directory_threshold = 10000
/// progress_interval = 100
///
/// [exclude]
/// patterns = [".git", "*.tmp"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Search worker tuning
    pub search: SearchConfig,

    /// Names skipped while walking
    pub exclude: ExcludeConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Session index file (None = default location)
    pub index_path: Option<PathBuf>,

    /// Named index catalog file (None = default location)
    pub catalog_path: Option<PathBuf>,

    /// Persist the index automatically after an indexing pass
    pub auto_save_index: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            index_path: None,
            catalog_path: None,
            auto_save_index: true,
            log_level: "info".to_string(),
        }
    }
}

/// Search worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// File count above which a live walk is refused in favor of indexing
    pub large_directory_threshold: usize,

    /// Emit a progress notification every this many processed files
    pub progress_interval: usize,

    /// Candidate count above which in-memory filtering runs in parallel
    pub parallel_threshold: usize,

    /// Maximum number of results shown by frontends (0 = unlimited)
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            large_directory_threshold: 10_000,
            progress_interval: 100,
            parallel_threshold: crate::search::DEFAULT_PARALLEL_THRESHOLD,
            max_results: 0,
        }
    }
}

/// Exclusion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExcludeConfig {
    /// Glob patterns matched against file and directory names
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path).map_err(|e| TrawlError::from_io(e, "read", path))?;
        let config: Config = toml::from_str(&contents).map_err(|e| TrawlError::Config {
            reason: format!("Failed to parse config: {}", e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TrawlError::from_io(e, "create", parent))?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| TrawlError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents).map_err(|e| TrawlError::from_io(e, "write", path))?;
        Ok(())
    }

    /// Reject values the worker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.search.progress_interval == 0 {
            return Err(TrawlError::Config {
                reason: "search.progress_interval must be at least 1".to_string(),
            });
        }
        for pattern in &self.exclude.patterns {
            glob::Pattern::new(pattern).map_err(|e| TrawlError::Config {
                reason: format!("invalid exclude pattern {:?}: {}", pattern, e),
            })?;
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("trawl.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Session index file (from config or default).
    pub fn index_path(&self) -> Result<PathBuf> {
        match &self.general.index_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::default_data_dir()?.join(crate::persistence::INDEX_FILE_NAME)),
        }
    }

    /// Named index catalog file (from config or default).
    pub fn catalog_path(&self) -> Result<PathBuf> {
        match &self.general.catalog_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::default_data_dir()?.join(crate::catalog::CATALOG_FILE_NAME)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "trawl").ok_or_else(|| TrawlError::Config {
        reason: "Could not determine config directory".to_string(),
    })
}
