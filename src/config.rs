use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MtimeError, Result};
use crate::manifest::MANIFEST_FILENAME;

pub const CONFIG_FILENAME: &str = ".mtstamp.toml";

fn default_manifest_name() -> String {
    MANIFEST_FILENAME.to_string()
}

/// Configuration loaded from .mtstamp.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File name of the manifest inside the output/manifest directory
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Paths/patterns skipped during capture (optional)
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Show progress bars (default: auto-detect TTY)
    #[serde(default)]
    pub progress: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
            ignore: Vec::new(),
            progress: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| MtimeError::io("read config file", config_path, e))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            MtimeError::Config(format!("failed to parse {}: {}", config_path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load the nearest .mtstamp.toml above `start`, or the defaults if there is none
    pub fn discover(start: &Path) -> Result<Self> {
        match find_config_file(start) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let name = self.manifest_name.as_str();
        if name.trim().is_empty() {
            return Err(MtimeError::Config("'manifest_name' is empty".to_string()));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(MtimeError::Config(format!(
                "'manifest_name' must be a plain file name, got '{}'",
                name
            )));
        }

        for pattern in &self.ignore {
            if pattern.trim().is_empty() {
                return Err(MtimeError::Config("empty pattern in 'ignore' list".to_string()));
            }
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(MtimeError::Config(format!(
                    "invalid ignore pattern '{}': {}",
                    pattern, e
                )));
            }
        }

        Ok(())
    }

    /// Check if a portable relative path should be skipped during capture
    pub fn should_ignore(&self, relative_path: &str) -> bool {
        for pattern in &self.ignore {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(relative_path) {
                    return true;
                }
            }

            // A plain directory prefix matches only whole leading components
            if relative_path == pattern || relative_path.starts_with(&format!("{}/", pattern)) {
                return true;
            }

            if relative_path.split('/').any(|component| component == pattern) {
                return true;
            }
        }

        false
    }
}

/// Find .mtstamp.toml in `start` or any parent directory
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        dir = current.parent();
    }

    None
}
