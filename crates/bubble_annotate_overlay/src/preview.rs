// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live preview scene for an egui surface.
//!
//! Rebuilt on every playback tick from the annotations visible at the
//! playhead. Geometry comes from the same layout functions the export uses.

use crate::layout::{arrow_label_rect, arrow_path, bubble_frame, Point, Rect};
use crate::raster::{legible_text_color, LABEL_FONT_SIZE};
use bubble_annotate_sequencer::{
    AnnotationContent, AnnotationItem, ArrowData, BubbleData, FontKeyword, RgbaColor,
    TextAlignment,
};
use egui::epaint::{RectShape, Shadow};
use egui::text::LayoutJob;
use egui::{Color32, FontFamily, FontId, Painter, Pos2, Rounding, Shape, Stroke, Vec2};

/// Text run placed in the preview
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewText {
    /// Text to draw
    pub text: String,
    /// Box the text is laid out in
    pub rect: egui::Rect,
    /// Font size in points
    pub font_size: f32,
    /// Monospace instead of proportional
    pub monospace: bool,
    /// Text color
    pub color: Color32,
    /// Horizontal alignment
    pub alignment: TextAlignment,
    /// Single line cut with an ellipsis instead of wrapping
    pub truncate: bool,
}

/// One drawable element, in paint order
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewElement {
    /// Vector shape
    Shape(Shape),
    /// Text laid out at paint time
    Text(PreviewText),
}

/// Everything visible at one playhead position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewScene {
    /// Elements bottom to top
    pub elements: Vec<PreviewElement>,
}

impl PreviewScene {
    /// Build the scene for the annotations visible at `now` inside `dest`
    pub fn build(items: &[AnnotationItem], now: f64, dest: Rect) -> Self {
        let mut visible: Vec<&AnnotationItem> = items
            .iter()
            .filter(|item| item.annotation.is_visible_at(now))
            .collect();
        visible.sort_by_key(|item| item.annotation.z_index);

        let mut scene = Self::default();
        for item in visible {
            match &item.content {
                AnnotationContent::Bubble(data) => scene.push_bubble(data, dest),
                AnnotationContent::Arrow(data) => scene.push_arrow(data, dest),
            }
        }
        scene
    }

    /// Whether nothing is visible
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Draw the scene
    pub fn paint(&self, painter: &Painter) {
        for element in &self.elements {
            match element {
                PreviewElement::Shape(shape) => {
                    painter.add(shape.clone());
                }
                PreviewElement::Text(text) => paint_text(painter, text),
            }
        }
    }

    fn push_bubble(&mut self, data: &BubbleData, dest: Rect) {
        let style = &data.style;
        let frame = bubble_frame(&data.geometry, dest);
        let rect = to_egui_rect(frame);
        let rounding = Rounding::same(style.corner_radius as f32);

        if style.shadow_opacity > 0.0 {
            let shadow = Shadow {
                offset: Vec2::new(0.0, style.shadow_offset_y as f32),
                blur: style.shadow_radius as f32,
                spread: 0.0,
                color: to_color32(RgbaColor::BLACK.with_alpha(style.shadow_opacity)),
            };
            self.elements
                .push(PreviewElement::Shape(Shape::Rect(shadow.as_shape(rect, rounding))));
        }

        let stroke = if style.border_width > 0.0 {
            Stroke::new(style.border_width as f32, to_color32(style.border_color))
        } else {
            Stroke::NONE
        };
        self.elements.push(PreviewElement::Shape(Shape::Rect(RectShape::new(
            rect,
            rounding,
            to_color32(style.background_color),
            stroke,
        ))));

        let content = frame.inset(style.padding);
        if content.size().is_positive() {
            self.elements.push(PreviewElement::Text(PreviewText {
                text: data.display_text(),
                rect: to_egui_rect(content),
                font_size: style.font_size as f32,
                monospace: style.font() == FontKeyword::Mono,
                color: to_color32(legible_text_color(style.text_color)),
                alignment: style.text_alignment,
                truncate: false,
            }));
        }
    }

    fn push_arrow(&mut self, data: &ArrowData, dest: Rect) {
        let style = &data.style;
        let path = arrow_path(&data.geometry, dest);
        let stroke = Stroke::new(style.thickness as f32, to_color32(style.color));
        let shaft = [to_pos(path.start), to_pos(path.end)];

        match style.dash_pattern() {
            Some([dash, gap]) => {
                for shape in Shape::dashed_line(&shaft, stroke, dash as f32, gap as f32) {
                    self.elements.push(PreviewElement::Shape(shape));
                }
            }
            None => self
                .elements
                .push(PreviewElement::Shape(Shape::line_segment(shaft, stroke))),
        }
        for (from, to) in path.head_strokes(style.head_size) {
            self.elements.push(PreviewElement::Shape(Shape::line_segment(
                [to_pos(from), to_pos(to)],
                stroke,
            )));
        }

        if let Some(label) = data.visible_label() {
            self.elements.push(PreviewElement::Text(PreviewText {
                text: label.to_string(),
                rect: to_egui_rect(arrow_label_rect(&path)),
                font_size: LABEL_FONT_SIZE as f32,
                monospace: false,
                color: Color32::BLACK,
                alignment: TextAlignment::Center,
                truncate: true,
            }));
        }
    }
}

fn paint_text(painter: &Painter, text: &PreviewText) {
    let family = if text.monospace {
        FontFamily::Monospace
    } else {
        FontFamily::Proportional
    };
    let mut job = LayoutJob::simple(
        text.text.clone(),
        FontId::new(text.font_size, family),
        text.color,
        text.rect.width(),
    );
    if text.truncate {
        job.wrap.max_rows = 1;
        job.wrap.break_anywhere = true;
    }
    let (halign, x) = match text.alignment {
        TextAlignment::Leading => (egui::Align::LEFT, text.rect.left()),
        TextAlignment::Center => (egui::Align::Center, text.rect.center().x),
        TextAlignment::Trailing => (egui::Align::RIGHT, text.rect.right()),
    };
    job.halign = halign;

    let galley = painter.layout_job(job);
    let y = if text.truncate {
        text.rect.center().y - galley.size().y / 2.0
    } else {
        text.rect.top()
    };
    painter
        .with_clip_rect(text.rect)
        .galley(Pos2::new(x, y), galley, text.color);
}

/// Convert a layout rectangle
pub fn to_egui_rect(rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        Pos2::new(rect.x as f32, rect.y as f32),
        Vec2::new(rect.width as f32, rect.height as f32),
    )
}

/// Convert an egui rectangle into a layout rectangle
pub fn from_egui_rect(rect: egui::Rect) -> Rect {
    Rect::new(
        f64::from(rect.min.x),
        f64::from(rect.min.y),
        f64::from(rect.width()),
        f64::from(rect.height()),
    )
}

fn to_pos(point: Point) -> Pos2 {
    Pos2::new(point.x as f32, point.y as f32)
}

fn to_color32(color: RgbaColor) -> Color32 {
    let [r, g, b, a] = color.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}
