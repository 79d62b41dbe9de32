//! Configuration file handling.
//!
//! Loads configuration from `<config dir>/cam-access/config.toml` or a custom
//! path. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::traits::FacingMode;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Camera defaults.
    #[serde(default)]
    pub camera: CameraConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[camera]` section.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Facing mode used when none is given on the command line.
    #[serde(default)]
    pub facing_mode: FacingMode,
    /// Device id to start when none is given on the command line.
    pub device: Option<String>,
    /// Pixel format requested from V4L2 (e.g. `MJPG`).
    pub pixel_format: Option<String>,
}

/// `[logging]` section.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_owned()
}

impl Config {
    /// Load configuration from `path`, or from [`default_path`] when `None`.
    ///
    /// Returns the default config if the file doesn't exist, and an error if
    /// it exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(default_path, Path::to_path_buf);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration.
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// Default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cam-access")
        .join("config.toml")
}
