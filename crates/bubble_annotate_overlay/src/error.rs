// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export error types.

use thiserror::Error;

/// Errors reported by a render primitive
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render stopped because cancellation was requested
    #[error("Render was cancelled")]
    Cancelled,

    /// Filesystem or process I/O failed
    #[error("Render I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The media backend reported a failure
    #[error("Render backend failed: {0}")]
    Backend(String),
}

/// Errors surfaced by an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// The source has no video stream
    #[error("Source has no video track")]
    NoVideoTrack,

    /// Assembling the composition or its overlay failed
    #[error("Failed to build composition: {0}")]
    CompositionBuildFailed(String),

    /// The render primitive failed; the cause is kept as the source
    #[error("Render failed")]
    RenderFailed(#[source] RenderError),

    /// The user cancelled the export
    #[error("Export was cancelled")]
    Cancelled,
}

impl ExportError {
    /// Whether this is a user cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
