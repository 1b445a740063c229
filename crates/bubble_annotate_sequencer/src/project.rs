// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project document model.
//!
//! The document is JSON with camelCase keys written in sorted order. Fields
//! added after version 1 are optional and default when absent.

use crate::timeline::AnnotationTimeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Current project format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// File extension of project documents
pub const PROJECT_EXTENSION: &str = "bubbleproj";

/// Errors reading or writing the project document
#[derive(Debug, Error)]
pub enum ProjectFormatError {
    /// Malformed JSON or a field of the wrong shape
    #[error("Project file is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// Document written by a newer version
    #[error("Project version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Output size and encoder constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreset {
    /// Display name
    pub name: String,
    /// Output width, `0` for the source width
    pub width: u32,
    /// Output height, `0` for the source height
    pub height: u32,
    /// Bitrate cap in Mbit/s
    #[serde(default)]
    pub max_bitrate_mbps: Option<f64>,
    /// Whether the container is laid out for progressive download
    #[serde(default)]
    pub is_web_optimized: bool,
}

impl ExportPreset {
    /// Export at the source resolution, the only active preset
    pub fn original() -> Self {
        Self {
            name: "Original".to_string(),
            width: 0,
            height: 0,
            max_bitrate_mbps: Some(12.0),
            is_web_optimized: true,
        }
    }

    /// Whether this preset keeps the source resolution
    pub fn is_source_resolution(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Preset name with spaces replaced, for file names
    pub fn file_stem(&self) -> String {
        self.name.replace(' ', "_")
    }
}

impl Default for ExportPreset {
    fn default() -> Self {
        Self::original()
    }
}

/// How a source is fitted into a preset of a different aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Letterbox or pillarbox inside the target
    #[default]
    Fit,
    /// Crop to fill the target
    Fill,
}

/// Export settings stored with the project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Selected preset
    #[serde(default)]
    pub preset: ExportPreset,
    /// Crop mode; only meaningful once resizing presets exist
    #[serde(default)]
    pub crop_mode: CropMode,
}

/// A project: source reference, annotations and export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Format version
    pub version: u32,
    /// Opaque platform bookmark of the source video, kept as written
    #[serde(default)]
    pub source_video_bookmark: Option<String>,
    /// Last known path of the source video
    #[serde(default)]
    pub source_video_path: Option<PathBuf>,
    /// Annotations
    #[serde(default)]
    pub annotations: AnnotationTimeline,
    /// Export settings
    #[serde(default)]
    pub export_settings: ExportSettings,
    /// Time of the last save
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project for a source video
    pub fn new(source_video_path: Option<PathBuf>) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION,
            source_video_bookmark: None,
            source_video_path,
            annotations: AnnotationTimeline::new(),
            export_settings: ExportSettings::default(),
            last_modified: None,
        }
    }

    /// Parse a project document
    pub fn from_json(json: &str) -> Result<Self, ProjectFormatError> {
        let project: Self = serde_json::from_str(json)?;
        if project.version > PROJECT_FORMAT_VERSION {
            return Err(ProjectFormatError::UnsupportedVersion {
                found: project.version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }
        Ok(project)
    }

    /// Write the project document: pretty printed, keys sorted
    pub fn to_json(&self) -> Result<String, ProjectFormatError> {
        // Round-tripping through `Value` sorts object keys.
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(None)
    }
}
