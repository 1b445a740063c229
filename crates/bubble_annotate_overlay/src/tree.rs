// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assembly of the export overlay tree.
//!
//! Every annotation becomes one full-frame container layer carrying its baked
//! opacity curve. Its children are positioned with the layout engine against
//! the output rectangle.

use crate::layer::{BoxStyle, Layer, LayerContents, OverlayTree, Shadow, StrokeStyle};
use crate::layout::{arrow_label_rect, arrow_path, bubble_frame, Point, Rect, Size};
use crate::raster::TextRasterizer;
use bubble_annotate_sequencer::{
    AnnotationContent, AnnotationItem, ArrowData, BubbleData, OpacityCurve, RgbaColor,
    VideoTransform,
};
use std::sync::Arc;

/// Build the overlay for an export.
///
/// `items` may be in any order; annotation layers come out sorted by
/// ascending z-index, ties kept in input order.
pub fn build_overlay_tree(
    items: &[AnnotationItem],
    size: Size,
    timeline_duration: f64,
    transform: VideoTransform,
    rasterizer: &mut TextRasterizer,
) -> OverlayTree {
    let dest = Rect::from_size(size);
    let mut ordered: Vec<&AnnotationItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.annotation.z_index);

    let annotations = ordered
        .into_iter()
        .map(|item| annotation_layer(item, dest, timeline_duration, rasterizer))
        .collect();

    OverlayTree {
        size,
        video: Layer::new("video", dest).with_contents(LayerContents::Video { transform }),
        annotations,
    }
}

/// Container layer for one annotation
pub fn annotation_layer(
    item: &AnnotationItem,
    dest: Rect,
    timeline_duration: f64,
    rasterizer: &mut TextRasterizer,
) -> Layer {
    let annotation = &item.annotation;
    let curve =
        OpacityCurve::schedule(annotation.start_time, annotation.end_time, timeline_duration);
    let mut container = Layer::new(
        format!("{}-{}", annotation.kind.name().to_lowercase(), annotation.id),
        dest,
    )
    .for_annotation(annotation.id)
    .with_opacity(curve);

    match &item.content {
        AnnotationContent::Bubble(data) => {
            container.add_sublayer(bubble_layer(data, dest, rasterizer));
        }
        AnnotationContent::Arrow(data) => {
            for layer in arrow_layers(data, dest, rasterizer) {
                container.add_sublayer(layer);
            }
        }
    }
    container
}

fn bubble_layer(data: &BubbleData, dest: Rect, rasterizer: &mut TextRasterizer) -> Layer {
    let style = &data.style;
    let frame = bubble_frame(&data.geometry, dest).relative_to(Point::new(dest.x, dest.y));
    let shadow = (style.shadow_opacity > 0.0).then_some(Shadow {
        color: RgbaColor::BLACK.with_alpha(style.shadow_opacity),
        radius: style.shadow_radius,
        offset_y: style.shadow_offset_y,
    });
    let border = (style.border_width > 0.0).then_some((style.border_color, style.border_width));

    let mut bubble = Layer::new("bubble", frame).with_contents(LayerContents::Box(BoxStyle {
        fill: style.background_color,
        corner_radius: style.corner_radius,
        border,
        shadow,
    }));

    let text_rect = Rect::from_size(frame.size()).inset(style.padding);
    match rasterizer.bubble_text(data, text_rect.size()) {
        Ok(image) => bubble.add_sublayer(
            Layer::new("text", text_rect).with_contents(LayerContents::Image(Arc::new(image))),
        ),
        Err(e) => tracing::debug!("Skipping bubble text: {}", e),
    }
    bubble
}

fn arrow_layers(data: &ArrowData, dest: Rect, rasterizer: &mut TextRasterizer) -> Vec<Layer> {
    let style = &data.style;
    let local = Rect::from_size(dest.size());
    let path = arrow_path(&data.geometry, local);

    let mut layers = vec![
        Layer::new("shaft", local).with_contents(LayerContents::Stroke(StrokeStyle {
            segments: vec![(path.start, path.end)],
            color: style.color,
            width: style.thickness,
            dash: style.dash_pattern(),
        })),
        Layer::new("head", local).with_contents(LayerContents::Stroke(StrokeStyle {
            segments: path.head_strokes(style.head_size).to_vec(),
            color: style.color,
            width: style.thickness,
            dash: None,
        })),
    ];

    if let Some(label) = data.visible_label() {
        match rasterizer.arrow_label(label) {
            Ok(image) => layers.push(
                Layer::new("label", arrow_label_rect(&path))
                    .with_contents(LayerContents::Image(Arc::new(image))),
            ),
            Err(e) => tracing::debug!("Skipping arrow label: {}", e),
        }
    }
    layers
}
