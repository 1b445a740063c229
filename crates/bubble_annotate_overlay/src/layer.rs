// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative overlay layer tree handed to the render primitive.

use crate::layout::{Point, Rect, Size};
use crate::raster::RasterImage;
use bubble_annotate_sequencer::{AnnotationId, OpacityCurve, RgbaColor, VideoTransform};
use std::sync::Arc;

/// Drop shadow behind a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Shadow color, alpha is the shadow opacity
    pub color: RgbaColor,
    /// Blur radius in pixels
    pub radius: f64,
    /// Vertical offset in pixels, positive moves the shadow down
    pub offset_y: f64,
}

/// Filled rounded rectangle filling the layer frame
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    /// Fill color
    pub fill: RgbaColor,
    /// Corner radius
    pub corner_radius: f64,
    /// Border color and width, drawn inside the frame
    pub border: Option<(RgbaColor, f64)>,
    /// Drop shadow
    pub shadow: Option<Shadow>,
}

/// Stroked line segments, in the layer's local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Segments as (from, to) pairs
    pub segments: Vec<(Point, Point)>,
    /// Stroke color
    pub color: RgbaColor,
    /// Line width
    pub width: f64,
    /// Dash pattern (dash, gap)
    pub dash: Option<[f64; 2]>,
}

/// What a layer draws
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContents {
    /// Nothing, grouping only
    Empty,
    /// Placeholder for the source video frames
    Video {
        /// Orientation transform applied to decoded frames
        transform: VideoTransform,
    },
    /// Rounded rectangle
    Box(BoxStyle),
    /// Stroked path
    Stroke(StrokeStyle),
    /// Bitmap stretched to the layer frame
    Image(Arc<RasterImage>),
}

/// A node in the overlay tree.
///
/// Frames are relative to the parent layer's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Debug name
    pub name: String,
    /// Annotation this layer belongs to
    pub annotation: Option<AnnotationId>,
    /// Frame in parent coordinates
    pub frame: Rect,
    /// Contents
    pub contents: LayerContents,
    /// Baked opacity animation; `None` means always fully opaque
    pub opacity: Option<OpacityCurve>,
    /// Children, drawn in order (last on top)
    pub sublayers: Vec<Layer>,
}

impl Layer {
    /// Create an empty layer
    pub fn new(name: impl Into<String>, frame: Rect) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            frame,
            contents: LayerContents::Empty,
            opacity: None,
            sublayers: Vec::new(),
        }
    }

    /// Set the contents
    #[must_use]
    pub fn with_contents(mut self, contents: LayerContents) -> Self {
        self.contents = contents;
        self
    }

    /// Set the opacity animation
    #[must_use]
    pub fn with_opacity(mut self, curve: OpacityCurve) -> Self {
        self.opacity = Some(curve);
        self
    }

    /// Tag with the annotation it renders
    #[must_use]
    pub fn for_annotation(mut self, id: AnnotationId) -> Self {
        self.annotation = Some(id);
        self
    }

    /// Append a child
    pub fn add_sublayer(&mut self, layer: Layer) {
        self.sublayers.push(layer);
    }

    /// Opacity at an absolute time
    pub fn opacity_at(&self, time: f64) -> f64 {
        self.opacity.as_ref().map_or(1.0, |curve| curve.opacity_at(time))
    }

    /// Number of layers in this subtree, including this one
    pub fn layer_count(&self) -> usize {
        1 + self.sublayers.iter().map(Layer::layer_count).sum::<usize>()
    }
}

/// Root of an export overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayTree {
    /// Output frame size
    pub size: Size,
    /// Background video layer
    pub video: Layer,
    /// One sub-layer per annotation, bottom to top
    pub annotations: Vec<Layer>,
}

impl OverlayTree {
    /// Annotation IDs in stacking order, bottom to top
    pub fn stacking_order(&self) -> Vec<AnnotationId> {
        self.annotations.iter().filter_map(|layer| layer.annotation).collect()
    }

    /// Flatten into a single parent layer: video first, annotations above
    pub fn into_root(self) -> Layer {
        let mut overlay = Layer::new("overlay", Rect::from_size(self.size));
        overlay.sublayers = self.annotations;
        let mut root = Layer::new("parent", Rect::from_size(self.size));
        root.sublayers = vec![self.video, overlay];
        root
    }
}
