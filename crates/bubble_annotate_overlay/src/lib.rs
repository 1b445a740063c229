// SPDX-License-Identifier: MIT OR Apache-2.0
//! Overlay rendering and export for `BubbleAnnotate`.
//!
//! This crate turns annotations into pixels:
//! - A layout engine mapping normalized geometry into a destination rectangle
//! - A text rasterizer producing supersampled RGBA pixmaps
//! - A declarative layer tree and a software painter for it
//! - The export compositor driving an external render primitive
//! - A live preview scene for egui surfaces
//!
//! ## Architecture
//!
//! The preview and the export both position annotations through [`layout`],
//! so what is placed on screen is what gets burned into the output. The
//! render-and-mux step sits behind the [`RenderPrimitive`] trait.

pub mod compositor;
pub mod error;
pub mod layer;
pub mod layout;
pub mod paint;
pub mod preview;
pub mod raster;
pub mod tree;

pub use compositor::{
    default_output_path, CompositorConfig, ExportCompositor, ExportPhase, ExportProgress,
    ExportRequest, RenderControl, RenderHandle, RenderJob, RenderPrimitive,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use error::{ExportError, RenderError};
pub use layer::{BoxStyle, Layer, LayerContents, OverlayTree, Shadow, StrokeStyle};
pub use layout::{ArrowPath, PixelGeometry, Point, Rect, Size};
pub use paint::{render_layer, render_overlay_at, LayerPainter};
pub use preview::{PreviewElement, PreviewScene, PreviewText};
pub use raster::{RasterError, RasterImage, TextOverflow, TextRasterizer, TextRequest};
pub use tree::build_overlay_tree;
