//! Configuration loading and layering
//!
//! Priority order (later sources override earlier ones):
//! 1. Built-in defaults
//! 2. Global config from `<config dir>/bigip-explode/config.yaml` (if exists)
//! 3. Explicit file passed with `--config` / `BIGIP_EXPLODE_CONFIG` (must exist)
//!
//! `BIGIP_EXPLODE_CONFIG_DIR` replaces the global config directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigOverlay, ExplodeConfig};
use crate::error::{Result, config_parse_failed, config_read_failed};

/// Environment variable overriding the global config directory
pub const CONFIG_DIR_ENV: &str = "BIGIP_EXPLODE_CONFIG_DIR";

/// File name of the global config inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Directory holding the global config file, if any
    global_dir: Option<PathBuf>,
    /// Explicitly requested config file
    explicit: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader using the user's config directory
    pub fn new() -> Self {
        let global_dir = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("bigip-explode")));
        Self {
            global_dir,
            explicit: None,
        }
    }

    /// Replace (or disable, with `None`) the global config directory
    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    /// Layer an explicit config file on top
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Build the effective configuration
    pub fn load(&self) -> Result<ExplodeConfig> {
        let mut config = ExplodeConfig::default();

        if let Some(dir) = &self.global_dir {
            let global = dir.join(CONFIG_FILE_NAME);
            if global.is_file() {
                tracing::debug!(path = %global.display(), "applying global config");
                config.apply(read_overlay(&global)?);
            }
        }

        if let Some(path) = &self.explicit {
            tracing::debug!(path = %path.display(), "applying config file");
            config.apply(read_overlay(path)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn read_overlay(path: &Path) -> Result<ConfigOverlay> {
    let display = path.display().to_string();
    let content =
        fs::read_to_string(path).map_err(|e| config_read_failed(&display, e.to_string()))?;
    serde_yaml::from_str::<Option<ConfigOverlay>>(&content)
        .map(Option::unwrap_or_default)
        .map_err(|e| config_parse_failed(display, e.to_string()))
}
