//! Configuration persistence for squarecrop settings

use anyhow::{Context, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image format written by crop export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpg,
    Png,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    /// Get the image crate encoder for this format
    pub fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Jpg => ImageFormat::Jpeg,
            ExportFormat::Png => ImageFormat::Png,
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    /// Side of the square window in pixels
    pub window_size: u32,
    /// Frame loop period in milliseconds
    pub frame_interval_ms: u64,
    /// Zoom factor increment per step
    pub zoom_step: f32,
    /// Sleep after a zoom so a stale pointer release is not read as a gesture
    pub zoom_debounce_ms: u64,
    /// Maximum pointer distance in pixels for grabbing a handle
    pub handle_tolerance: f32,
    /// Format of exported crops
    pub export_format: ExportFormat,
    /// Number of background worker threads
    pub worker_threads: usize,
    /// Pending task slots before submissions are refused
    pub task_queue_capacity: usize,
    /// Base path handed to detectors on load (None = working directory)
    pub detector_base: Option<PathBuf>,
    /// Detections below this confidence are dropped
    pub min_confidence: f32,
    /// Thumbnail distance below which two images count as duplicates
    pub similar_threshold: f32,
    /// How many retained images a candidate is compared with (0 = all)
    pub similar_window: usize,
    /// Show the welcome balloon at start-up
    pub show_welcome: bool,
    /// Square up near-square images when a finished folder is reopened
    pub final_square_check: bool,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            // Fits a 1080p screen with room for decorations
            window_size: 900,
            // Roughly 33 frames per second
            frame_interval_ms: 30,
            zoom_step: 0.25,
            zoom_debounce_ms: 50,
            handle_tolerance: 7.0,
            export_format: ExportFormat::Jpg,
            worker_threads: 2,
            task_queue_capacity: 4,
            detector_base: None,
            min_confidence: 0.8,
            similar_threshold: 1.0,
            similar_window: 0,
            show_welcome: true,
            final_square_check: true,
        }
    }
}

impl CropperConfig {
    /// Application directory name under the user config dir
    pub const ID: &'static str = "squarecrop";

    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Read configuration from an explicit file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            log::error!("Could not determine config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    /// Write configuration to an explicit file, creating parent directories
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Base path handed to detectors on load
    pub fn detector_base(&self) -> PathBuf {
        self.detector_base
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: CropperConfig =
            serde_json::from_str(r#"{"window_size": 600, "export_format": "png"}"#).unwrap();
        assert_eq!(config.window_size, 600);
        assert_eq!(config.export_format, ExportFormat::Png);
        assert_eq!(config.handle_tolerance, 7.0);
        assert!(config.show_welcome);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = CropperConfig {
            zoom_step: 0.5,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(CropperConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(CropperConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_export_extension() {
        assert_eq!(ExportFormat::Jpg.extension(), "jpg");
        assert_eq!(ExportFormat::Png.image_format(), ImageFormat::Png);
    }
}
