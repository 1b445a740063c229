// SPDX-License-Identifier: MIT OR Apache-2.0
//! Software painter for overlay layer trees.
//!
//! Draws boxes, strokes and rasterized text into tiny-skia pixmaps. Layers
//! carrying an opacity curve are composited as a group so overlapping
//! children fade together.

use crate::layer::{BoxStyle, Layer, LayerContents, OverlayTree, StrokeStyle};
use crate::layout::{Point, Rect, Size};
use crate::raster::{RasterError, RasterImage, Result};
use bubble_annotate_sequencer::RgbaColor;
use tiny_skia::{
    Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, StrokeDash, Transform,
};

/// Number of concentric passes used to approximate a blurred shadow
const SHADOW_STEPS: u32 = 6;

/// Paints a layer tree at one instant
#[derive(Debug, Clone, Copy)]
pub struct LayerPainter {
    /// Time used to sample opacity curves; `None` paints everything opaque
    time: Option<f64>,
}

impl LayerPainter {
    /// Painter that samples opacity curves at `time`
    pub fn at_time(time: f64) -> Self {
        Self { time: Some(time) }
    }

    /// Painter that ignores opacity curves
    pub fn opaque() -> Self {
        Self { time: None }
    }

    /// Paint `layer` and its subtree onto `canvas`, with `origin` as the
    /// parent's top-left corner in canvas pixels
    pub fn paint(&self, canvas: &mut Pixmap, layer: &Layer, origin: Point) {
        let opacity = self.time.map_or(1.0, |time| layer.opacity_at(time));
        if opacity <= 0.0 {
            return;
        }
        let frame = Rect::new(
            origin.x + layer.frame.x,
            origin.y + layer.frame.y,
            layer.frame.width,
            layer.frame.height,
        );

        if opacity >= 1.0 {
            self.paint_subtree(canvas, layer, frame);
            return;
        }

        let Some(mut group) = Pixmap::new(canvas.width(), canvas.height()) else {
            return;
        };
        self.paint_subtree(&mut group, layer, frame);
        let paint = PixmapPaint {
            opacity: opacity as f32,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(0, 0, group.as_ref(), &paint, Transform::identity(), None);
    }

    fn paint_subtree(&self, canvas: &mut Pixmap, layer: &Layer, frame: Rect) {
        match &layer.contents {
            LayerContents::Empty | LayerContents::Video { .. } => {}
            LayerContents::Box(style) => fill_box(canvas, frame, style),
            LayerContents::Stroke(style) => stroke_segments(canvas, frame, style),
            LayerContents::Image(image) => draw_image(canvas, frame, image),
        }
        let origin = Point::new(frame.x, frame.y);
        for child in &layer.sublayers {
            self.paint(canvas, child, origin);
        }
    }
}

/// Render the annotation layers of `tree` at `time` onto a transparent frame.
///
/// The video layer is left out; the result is meant to be laid over a
/// decoded video frame.
pub fn render_overlay_at(tree: &OverlayTree, time: f64) -> Result<RasterImage> {
    let mut canvas = blank_canvas(tree.size)?;
    let painter = LayerPainter::at_time(time);
    for layer in &tree.annotations {
        painter.paint(&mut canvas, layer, Point::default());
    }
    Ok(RasterImage::from_pixmap(canvas, tree.size))
}

/// Render one layer subtree fully opaque onto a transparent canvas of `size`
pub fn render_layer(layer: &Layer, size: Size) -> Result<RasterImage> {
    let mut canvas = blank_canvas(size)?;
    LayerPainter::opaque().paint(&mut canvas, layer, Point::default());
    Ok(RasterImage::from_pixmap(canvas, size))
}

fn blank_canvas(size: Size) -> Result<Pixmap> {
    let empty = || RasterError::EmptyBounds {
        width: size.width,
        height: size.height,
    };
    if !size.is_positive() {
        return Err(empty());
    }
    Pixmap::new(size.width.round() as u32, size.height.round() as u32).ok_or_else(empty)
}

fn skia_color(color: RgbaColor) -> Color {
    let [r, g, b, a] = color.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}

fn solid_paint(color: RgbaColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn fill_box(canvas: &mut Pixmap, frame: Rect, style: &BoxStyle) {
    if let Some(shadow) = style.shadow {
        let base = Rect::new(frame.x, frame.y + shadow.offset_y, frame.width, frame.height);
        let step_alpha = shadow.color.alpha / f64::from(SHADOW_STEPS);
        let paint = solid_paint(shadow.color.with_alpha(step_alpha));
        for step in 0..SHADOW_STEPS {
            let spread = shadow.radius * f64::from(SHADOW_STEPS - step) / f64::from(SHADOW_STEPS);
            let rect = base.outset(spread / 2.0);
            if let Some(path) = rounded_rect_path(rect, style.corner_radius + spread / 2.0) {
                canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    }

    if let Some(path) = rounded_rect_path(frame, style.corner_radius) {
        canvas.fill_path(
            &path,
            &solid_paint(style.fill),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    if let Some((color, width)) = style.border {
        let inner = frame.inset(width / 2.0);
        if let Some(path) = rounded_rect_path(inner, (style.corner_radius - width / 2.0).max(0.0)) {
            let stroke = Stroke {
                width: width as f32,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            canvas.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
        }
    }
}

fn stroke_segments(canvas: &mut Pixmap, frame: Rect, style: &StrokeStyle) {
    let mut pb = PathBuilder::new();
    for (from, to) in &style.segments {
        pb.move_to((frame.x + from.x) as f32, (frame.y + from.y) as f32);
        pb.line_to((frame.x + to.x) as f32, (frame.y + to.y) as f32);
    }
    let Some(path) = pb.finish() else { return };

    let stroke = Stroke {
        width: style.width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: style
            .dash
            .and_then(|[dash, gap]| StrokeDash::new(vec![dash as f32, gap as f32], 0.0)),
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &solid_paint(style.color), &stroke, Transform::identity(), None);
}

fn draw_image(canvas: &mut Pixmap, frame: Rect, image: &RasterImage) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let sx = frame.width / f64::from(image.width());
    let sy = frame.height / f64::from(image.height());
    let transform = Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, frame.x as f32, frame.y as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);
}

/// Rounded rectangle outline; the radius is capped at half the short side
fn rounded_rect_path(rect: Rect, radius: f64) -> Option<tiny_skia::Path> {
    if !rect.size().is_positive() {
        return None;
    }
    let (x, y, w, h) = (rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);
    let r = (radius.max(0.0) as f32).min(w / 2.0).min(h / 2.0);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_sequencer::OpacityCurve;

    fn alpha_at(image: &RasterImage, x: u32, y: u32) -> u8 {
        image.data()[((y * image.width() + x) * 4 + 3) as usize]
    }

    fn red_box(frame: Rect) -> Layer {
        Layer::new("box", frame).with_contents(LayerContents::Box(BoxStyle {
            fill: RgbaColor::new(1.0, 0.0, 0.0, 1.0),
            corner_radius: 4.0,
            border: None,
            shadow: None,
        }))
    }

    #[test]
    fn test_box_fills_its_frame_only() {
        let image = render_layer(&red_box(Rect::new(10.0, 10.0, 20.0, 20.0)), Size::new(50.0, 50.0)).unwrap();
        assert_eq!(alpha_at(&image, 20, 20), 255);
        assert_eq!(alpha_at(&image, 45, 45), 0);
        assert_eq!(alpha_at(&image, 2, 2), 0);
    }

    #[test]
    fn test_child_frames_are_parent_relative() {
        let mut parent = Layer::new("group", Rect::new(20.0, 20.0, 30.0, 30.0));
        parent.add_sublayer(red_box(Rect::new(5.0, 5.0, 10.0, 10.0)));
        let image = render_layer(&parent, Size::new(60.0, 60.0)).unwrap();
        assert_eq!(alpha_at(&image, 30, 30), 255);
        assert_eq!(alpha_at(&image, 10, 10), 0);
    }

    #[test]
    fn test_opacity_curve_gates_painting() {
        let size = Size::new(40.0, 40.0);
        let mut container = Layer::new("a", Rect::from_size(size))
            .with_opacity(OpacityCurve::schedule(2.0, 4.0, 10.0));
        container.add_sublayer(red_box(Rect::new(0.0, 0.0, 40.0, 40.0)));
        let tree = OverlayTree {
            size,
            video: Layer::new("video", Rect::from_size(size)),
            annotations: vec![container],
        };

        let before = render_overlay_at(&tree, 1.0).unwrap();
        assert!(before.is_blank());
        let during = render_overlay_at(&tree, 3.0).unwrap();
        assert_eq!(alpha_at(&during, 20, 20), 255);
        let after = render_overlay_at(&tree, 6.0).unwrap();
        assert!(after.is_blank());
    }

    #[test]
    fn test_stroke_draws_along_segment() {
        let layer = Layer::new("shaft", Rect::new(0.0, 0.0, 100.0, 20.0)).with_contents(
            LayerContents::Stroke(StrokeStyle {
                segments: vec![(Point::new(0.0, 10.0), Point::new(100.0, 10.0))],
                color: RgbaColor::WHITE,
                width: 4.0,
                dash: None,
            }),
        );
        let image = render_layer(&layer, Size::new(100.0, 20.0)).unwrap();
        assert_eq!(alpha_at(&image, 50, 10), 255);
        assert_eq!(alpha_at(&image, 50, 1), 0);
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let layer = Layer::new("shaft", Rect::new(0.0, 0.0, 100.0, 20.0)).with_contents(
            LayerContents::Stroke(StrokeStyle {
                segments: vec![(Point::new(0.0, 10.0), Point::new(100.0, 10.0))],
                color: RgbaColor::WHITE,
                width: 2.0,
                dash: Some([10.0, 10.0]),
            }),
        );
        let image = render_layer(&layer, Size::new(100.0, 20.0)).unwrap();
        assert_eq!(alpha_at(&image, 5, 10), 255);
        assert_eq!(alpha_at(&image, 15, 10), 0);
    }

    #[test]
    fn test_empty_canvas_rejected() {
        let layer = Layer::new("empty", Rect::default());
        assert!(render_layer(&layer, Size::new(0.0, 10.0)).is_err());
    }
}
