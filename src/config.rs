//! Configuration System
//!
//! Handles loading head options from files and environment variables.
//! Supports TOML config files and environment variable overrides. Only
//! the passive options live here; the lifecycle hook is code, not
//! configuration, and is attached programmatically.

use crate::head::{HeadOptions, DEFAULT_CHUNK_RANGE_MS, DEFAULT_STRIPE_COUNT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub head: HeadConfig,
}

/// Head index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_chunk_range")]
    pub chunk_range_ms: i64,

    #[serde(default = "default_stripe_count")]
    pub stripe_count: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("headwater").to_string_lossy().to_string())
        .unwrap_or_else(|| "./headwater_data".to_string())
}

fn default_chunk_range() -> i64 {
    DEFAULT_CHUNK_RANGE_MS
}

fn default_stripe_count() -> usize {
    DEFAULT_STRIPE_COUNT
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_range_ms: default_chunk_range(),
            stripe_count: default_stripe_count(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("headwater").join("config.toml")),
            Some(PathBuf::from("/etc/headwater/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("HEADWATER_DATA_DIR") {
            self.head.data_dir = data_dir;
        }
        if let Ok(range) = std::env::var("HEADWATER_CHUNK_RANGE_MS") {
            if let Ok(r) = range.parse() {
                self.head.chunk_range_ms = r;
            }
        }
        if let Ok(stripes) = std::env::var("HEADWATER_STRIPE_COUNT") {
            if let Ok(s) = stripes.parse() {
                self.head.stripe_count = s;
            }
        }
    }

    /// Convert into head options, with the default no-op lifecycle
    ///
    /// Attach a real hook with `HeadOptions::with_lifecycle`.
    pub fn head_options(&self) -> HeadOptions {
        HeadOptions {
            data_dir: PathBuf::from(&self.head.data_dir),
            chunk_range: self.head.chunk_range_ms,
            stripe_count: self.head.stripe_count,
            ..Default::default()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Headwater Configuration
#
# Environment variables override these settings:
# - HEADWATER_DATA_DIR
# - HEADWATER_CHUNK_RANGE_MS
# - HEADWATER_STRIPE_COUNT

[head]
# Root directory handed to the chunk subsystem
data_dir = "~/.local/share/headwater"

# Width of one chunk in milliseconds
chunk_range_ms = 7200000

# Number of stripes per view of the series index (power of two)
stripe_count = 16384
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.head.chunk_range_ms, DEFAULT_CHUNK_RANGE_MS);
        assert_eq!(config.head.stripe_count, DEFAULT_STRIPE_COUNT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[head]
data_dir = "/tmp/hw-test"
chunk_range_ms = 1000
stripe_count = 64
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.head.data_dir, "/tmp/hw-test");
        assert_eq!(config.head.chunk_range_ms, 1000);
        assert_eq!(config.head.stripe_count, 64);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[head]\nchunk_range_ms = 5000\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.head.chunk_range_ms, 5000);
        assert_eq!(config.head.stripe_count, DEFAULT_STRIPE_COUNT);
    }

    #[test]
    fn test_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not toml at all [").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_head_options_conversion() {
        let mut config = Config::default();
        config.head.data_dir = "/tmp/hw".to_string();
        config.head.chunk_range_ms = 1000;
        config.head.stripe_count = 32;

        let options = config.head_options();
        assert_eq!(options.data_dir, PathBuf::from("/tmp/hw"));
        assert_eq!(options.chunk_range, 1000);
        assert_eq!(options.stripe_count, 32);
    }

    #[test]
    fn test_generated_default_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.head.chunk_range_ms, DEFAULT_CHUNK_RANGE_MS);
    }
}
