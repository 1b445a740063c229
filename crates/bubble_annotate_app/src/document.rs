// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project document persistence.

use bubble_annotate_sequencer::{Project, ProjectFormatError, PROJECT_EXTENSION};
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading or writing the file failed
    #[error("Project file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed document
    #[error("Project file is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer version
    #[error("Project version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

impl From<ProjectFormatError> for DocumentError {
    fn from(error: ProjectFormatError) -> Self {
        match error {
            ProjectFormatError::Json(e) => Self::Json(e),
            ProjectFormatError::UnsupportedVersion { found, supported } => {
                Self::UnsupportedVersion { found, supported }
            }
        }
    }
}

/// Load a project document
pub fn load_project(path: &Path) -> Result<Project, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    let project = Project::from_json(&content)?;
    tracing::info!(
        "Loaded project {} ({} annotations)",
        path.display(),
        project.annotations.len()
    );
    Ok(project)
}

/// Save a project document, stamping its modification time
pub fn save_project(project: &mut Project, path: &Path) -> Result<(), DocumentError> {
    project.last_modified = Some(Utc::now());
    let content = project.to_json()?;
    std::fs::write(path, content)?;
    tracing::info!("Saved project to {}", path.display());
    Ok(())
}

/// Path of the project document that sits next to a video
pub fn project_path_for(video: &Path) -> PathBuf {
    video.with_extension(PROJECT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_sequencer::AnnotationItem;

    #[test]
    fn test_save_stamps_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.bubbleproj");
        let mut project = Project::new(Some(PathBuf::from("/videos/demo.mov")));
        project.annotations.add(AnnotationItem::bubble(0.0, 3.0));
        project.annotations.add(AnnotationItem::arrow(1.0, 4.0));

        save_project(&mut project, &path).unwrap();
        assert!(project.last_modified.is_some());

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.annotations.len(), 2);
        assert_eq!(loaded.source_video_path, project.source_video_path);
        assert!(loaded.last_modified.is_some());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.bubbleproj");
        let mut project = Project::default();
        project.version = 99;
        std::fs::write(&path, project.to_json().unwrap()).unwrap();
        assert!(matches!(
            load_project(&path),
            Err(DocumentError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_project(&dir.path().join("none.bubbleproj")), Err(DocumentError::Io(_))));

        let bad = dir.path().join("bad.bubbleproj");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_project(&bad), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_project_path_next_to_video() {
        assert_eq!(
            project_path_for(Path::new("/videos/demo.mov")),
            PathBuf::from("/videos/demo.bubbleproj")
        );
    }
}
