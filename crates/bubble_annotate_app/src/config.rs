// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application configuration.
//!
//! Stored as RON. Every field has a default, so a partial file or no file at
//! all is valid.

use bubble_annotate_overlay::CompositorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "bubble_annotate.ron";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for [`AppConfig`]
    #[error("Config file is invalid: {0}")]
    Parse(String),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Export progress sampling interval in milliseconds
    pub progress_interval_ms: u64,
    /// Directory exports are written to when no output path is given
    pub output_dir: PathBuf,
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// ffprobe executable
    pub ffprobe_path: PathBuf,
    /// x264 constant rate factor
    pub video_crf: u8,
    /// x264 speed preset
    pub video_preset: String,
    /// Maximum undo depth
    pub undo_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            progress_interval_ms: 200,
            output_dir: std::env::temp_dir(),
            ffmpeg_path: find_tool("ffmpeg"),
            ffprobe_path: find_tool("ffprobe"),
            video_crf: 18,
            video_preset: "slow".to_string(),
            undo_depth: crate::history::DEFAULT_UNDO_DEPTH,
        }
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content =
            ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compositor settings derived from this configuration
    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            progress_interval: Duration::from_millis(self.progress_interval_ms.max(1)),
        }
    }
}

/// Locate a tool on `PATH`, falling back to the bare name
fn find_tool(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.video_crf, 18);
        assert_eq!(config.video_preset, "slow");
        assert_eq!(config.undo_depth, 100);
        assert_eq!(config.compositor_config().progress_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = AppConfig {
            log_filter: "debug".to_string(),
            video_crf: 23,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "(progress_interval_ms: 50)").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.progress_interval_ms, 50);
        assert_eq!(config.video_preset, "slow");
    }

    #[test]
    fn test_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ron");
        assert_eq!(AppConfig::load_or_default(&missing).unwrap().undo_depth, 100);

        let invalid = dir.path().join("invalid.ron");
        std::fs::write(&invalid, "(video_crf: \"high\")").unwrap();
        assert!(matches!(AppConfig::load(&invalid), Err(ConfigError::Parse(_))));
    }
}
