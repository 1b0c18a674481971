//! Configuration management for discpack.
//!
//! This module handles loading and saving configuration from/to TOML files.
//! Configuration covers the default media, scan filters, staging behaviour and
//! UI preferences. On first run, a default configuration is automatically
//! created. Command-line flags always take precedence over these values.

use color_eyre::Result;
use color_eyre::eyre::eyre;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capacity::{DEFAULT_RESERVE_PERCENT, DEFAULT_UNIT};
use crate::materialise::LinkStrategy;

/// Main configuration structure for discpack.
///
/// Every section falls back to its defaults when missing, so a file only needs
/// to carry the values it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub scan: ScanConfig,
    pub stage: StageConfig,
    pub ui: UIConfig,
}

/// Default target medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Media profile name, e.g. "dvd5". Takes precedence over `capacity`.
    pub profile: Option<String>,
    /// Explicit capacity, interpreted in `unit`
    pub capacity: Option<f64>,
    pub unit: String,
    pub reserve_percent: f64,
    /// Bytes added to every file's size when packing
    pub per_file_overhead: u64,
}

/// Directory scanning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions to keep, without the dot. Empty keeps everything.
    pub include_extensions: Vec<String>,
    /// Glob patterns matched against file names
    pub exclude_patterns: Vec<String>,
    pub follow_symlinks: bool,
    pub ignore_hidden: bool,
}

/// Staging tree configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub link_type: LinkStrategy,
    /// Maximum number of entries created at once; 1 stages sequentially
    pub max_concurrent_links: usize,
}

/// User interface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    /// Show spinners and progress bars
    pub progress: bool,
    pub color: ColorConfig,
}

/// Color theme configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Theme name: "default", "cyan", "magenta", "yellow", "green", "red", "blue", "white"
    pub theme: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            profile: None,
            capacity: None,
            unit: DEFAULT_UNIT.to_string(),
            reserve_percent: DEFAULT_RESERVE_PERCENT,
            per_file_overhead: 0,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            follow_symlinks: false,
            ignore_hidden: true,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            link_type: LinkStrategy::Symlink,
            max_concurrent_links: 1,
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            progress: true,
            color: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path.
    ///
    /// Typically `~/.config/discpack` on Unix systems or
    /// `%USERPROFILE%/.config/discpack` on Windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn get_config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| eyre!("Could not determine home directory"))?;

        Ok(PathBuf::from(home).join(".config").join("discpack"))
    }

    /// Returns the configuration file path, typically `~/.config/discpack/config.toml`.
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default location, creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if file I/O fails or if the TOML is malformed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use discpack::config::Config;
    ///
    /// # fn main() -> color_eyre::Result<()> {
    /// let config = Config::load()?;
    /// println!("Reserving {}%", config.media.reserve_percent);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!(path = %config_path.display(), "created default config");
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| eyre!("Could not read config {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| eyre!("Invalid config {}: {}", path.display(), e))?;

        Ok(config)
    }

    /// Saves the configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.media.profile, None);
        assert_eq!(config.media.capacity, None);
        assert_eq!(config.media.unit, "GiB");
        assert_eq!(config.media.reserve_percent, 2.0);
        assert_eq!(config.media.per_file_overhead, 0);

        assert!(config.scan.include_extensions.is_empty());
        assert!(config.scan.exclude_patterns.is_empty());
        assert!(!config.scan.follow_symlinks);
        assert!(config.scan.ignore_hidden);

        assert_eq!(config.stage.link_type, LinkStrategy::Symlink);
        assert_eq!(config.stage.max_concurrent_links, 1);

        assert!(config.ui.progress);
        assert_eq!(config.ui.color.theme, "default");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[media]\nprofile = \"bdr25\"\n\n[stage]\nlink_type = \"hardlink\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.media.profile.as_deref(), Some("bdr25"));
        assert_eq!(config.media.reserve_percent, 2.0);
        assert_eq!(config.stage.link_type, LinkStrategy::Hardlink);
        assert_eq!(config.stage.max_concurrent_links, 1);
        assert!(config.scan.ignore_hidden);
        assert_eq!(config.ui, UIConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.media.capacity = Some(700.0);
        config.media.unit = "MiB".to_string();
        config.scan.exclude_patterns = vec!["*.tmp".to_string()];
        config.stage.link_type = LinkStrategy::Copy;
        config.ui.color.theme = "cyan".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_link_type_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[stage]\nlink_type = \"reflink\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();

        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
