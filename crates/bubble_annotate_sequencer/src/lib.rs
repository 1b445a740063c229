// SPDX-License-Identifier: MIT OR Apache-2.0
//! Annotation model and timing for `BubbleAnnotate`.
//!
//! This crate holds everything that is independent of pixels:
//! - Annotation entities with normalized geometry (y measured from the bottom)
//! - Bubble and arrow styles with their presets
//! - The frame clock used for snapping and stepping
//! - Opacity keyframe curves that fade annotations in and out
//! - The ordered annotation list and the preview transport
//! - The project document model
//!
//! ## Architecture
//!
//! Layout, rasterization and export live in `bubble_annotate_overlay`, which
//! consumes these types. The [`media::MediaAsset`] trait is the seam to the
//! external media subsystem.

pub mod annotation;
pub mod clock;
pub mod keyframe;
pub mod media;
pub mod project;
pub mod style;
pub mod timeline;

pub use annotation::{
    Annotation, AnnotationContent, AnnotationId, AnnotationItem, AnnotationKind, ArrowData,
    ArrowGeometry, BubbleData, BubbleGeometry, DEFAULT_DURATION, MIN_DURATION,
};
pub use clock::{FrameClock, DEFAULT_FRAME_RATE};
pub use keyframe::{Interpolation, Keyframe, OpacityCurve};
pub use media::{MediaAsset, VideoTrackInfo, VideoTransform};
pub use project::{
    CropMode, ExportPreset, ExportSettings, Project, ProjectFormatError, PROJECT_EXTENSION,
    PROJECT_FORMAT_VERSION,
};
pub use style::{
    ArrowStyle, BackgroundPreset, BubbleAnimation, BubbleStyle, FontKeyword, RgbaColor,
    TextAlignment,
};
pub use timeline::{AnnotationTimeline, PlaybackController, PlaybackState, TimelineError};
