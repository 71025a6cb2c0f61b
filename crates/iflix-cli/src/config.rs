//! Config file holding the response language, page sizes and search
//! debounce.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use iflix_core::PagingConfig;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB request settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Page sizes.
    #[serde(default)]
    pub paging: PagingSettings,
    /// Search coordination settings.
    #[serde(default)]
    pub search: SearchSettings,
}

/// TMDB request settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// Response language (e.g. `en-US`, `ja-JP`).
    pub language: String,
    /// API base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            language: String::from("en-US"),
            base_url: None,
        }
    }
}

/// Items per page for list sections and the now-playing banner.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PagingSettings {
    /// List section page size.
    pub page_size: u32,
    /// Now-playing page size.
    pub now_playing_page_size: u32,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            page_size: PagingConfig::default().page_size,
            now_playing_page_size: PagingConfig::now_playing().page_size,
        }
    }
}

/// Search coordination settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchSettings {
    /// Quiet period after typing before a search fires, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl SearchSettings {
    /// Debounce window as a `Duration`.
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Config file name, both under `--dir` and the per-user directory.
const CONFIG_FILE_NAME: &str = "config.toml";

impl AppConfig {
    /// Config file location: `{dir}/config.toml` when `--dir` is given,
    /// otherwise `~/.config/iflix/config.toml`. The cache database sits
    /// next to it under `--dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is `None` and `HOME` is not set.
    pub fn path(dir: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = dir {
            return Ok(dir.join(CONFIG_FILE_NAME));
        }
        let home = std::env::var("HOME").context("HOME environment variable is not set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("iflix")
            .join(CONFIG_FILE_NAME))
    }

    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.tmdb.language.trim().is_empty() {
            bail!("tmdb.language must not be empty");
        }
        if self.paging.page_size == 0 || self.paging.now_playing_page_size == 0 {
            bail!("paging sizes must be at least 1");
        }
        Ok(())
    }

    /// Page size for list sections.
    pub const fn list_paging(&self) -> PagingConfig {
        PagingConfig::new(self.paging.page_size)
    }

    /// Page size for the now-playing section.
    pub const fn now_playing_paging(&self) -> PagingConfig {
        PagingConfig::new(self.paging.now_playing_page_size)
    }
}
