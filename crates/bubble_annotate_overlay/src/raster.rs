// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text rasterizer.
//!
//! The export overlay cannot carry live text, so captions and labels are
//! shaped with cosmic-text and drawn into fixed-size premultiplied RGBA
//! pixmaps. Pixmaps are rendered at [`SUPERSAMPLE`] times their logical size.

use crate::layout::{Size, ARROW_LABEL_SIZE};
use bubble_annotate_sequencer::{BubbleData, FontKeyword, RgbaColor, TextAlignment};
use cosmic_text::{
    Align, Attrs, Buffer, Color as CosmicColor, Family, FontSystem, Metrics, Shaping, SwashCache,
    Wrap,
};
use thiserror::Error;
use tiny_skia::{Paint, Pixmap, Transform};

/// Pixel density of rasterized text relative to its logical bounds
pub const SUPERSAMPLE: f64 = 2.0;

/// Font size factor applied on export relative to the preview font size.
///
/// Empirical constant: the preview measures fonts in display points while the
/// export renders against frame pixels. Existing projects depend on it.
pub const EXPORT_FONT_SCALE: f64 = 1.5;

/// Font size of arrow labels in points
pub const LABEL_FONT_SIZE: f64 = 14.0;

/// Line height as a multiple of the font size
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Text colors more transparent than this are drawn opaque
const MIN_TEXT_ALPHA: f64 = 0.01;

/// Text color with near-transparent colors forced opaque
pub(crate) fn legible_text_color(color: RgbaColor) -> RgbaColor {
    if color.alpha < MIN_TEXT_ALPHA {
        color.with_alpha(1.0)
    } else {
        color
    }
}

/// Rasterization errors
#[derive(Debug, Error)]
pub enum RasterError {
    /// Requested bounds have no area once supersampled
    #[error("Text bounds {width}x{height} are empty")]
    EmptyBounds {
        /// Logical width
        width: f64,
        /// Logical height
        height: f64,
    },

    /// PNG encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result type for rasterization
pub type Result<T> = std::result::Result<T, RasterError>;

/// How text that does not fit is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOverflow {
    /// Wrap at word boundaries; lines past the bottom are clipped
    WordWrap,
    /// Single line, cut with an ellipsis at the end
    TruncateTail,
}

/// One rasterization job
#[derive(Debug, Clone)]
pub struct TextRequest<'a> {
    /// Text to draw
    pub text: &'a str,
    /// Font family keyword
    pub font: FontKeyword<'a>,
    /// Font size in logical points
    pub font_size: f64,
    /// Text color
    pub color: RgbaColor,
    /// Horizontal alignment
    pub alignment: TextAlignment,
    /// Overflow handling
    pub overflow: TextOverflow,
    /// Logical size of the output
    pub bounds: Size,
}

/// A rasterized image: premultiplied RGBA pixels plus its logical size
#[derive(Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
    logical_size: Size,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("logical_size", &self.logical_size)
            .finish()
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.logical_size == other.logical_size && self.pixmap.data() == other.pixmap.data()
    }
}

impl RasterImage {
    /// Wrap a pixmap that stands for `logical_size`
    pub fn from_pixmap(pixmap: Pixmap, logical_size: Size) -> Self {
        Self { pixmap, logical_size }
    }

    /// Pixel width
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Pixel height
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Size the image stands for when placed in a layer
    pub fn logical_size(&self) -> Size {
        self.logical_size
    }

    /// Premultiplied RGBA bytes, row-major
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Underlying pixmap
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Whether every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixmap.data().chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Encode as PNG (straight alpha)
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RasterError::Encode(e.to_string()))
    }
}

/// Shapes and draws text; owns the font database and glyph cache
pub struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextRasterizer {
    /// Create a rasterizer backed by the system fonts
    pub fn new() -> Self {
        let font_system = FontSystem::new();
        tracing::debug!("Loaded {} font faces", font_system.db().len());
        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    /// Whether any font face is available
    pub fn has_fonts(&self) -> bool {
        !self.font_system.db().is_empty()
    }

    /// Rasterize bubble text for the export overlay.
    ///
    /// The leading glyph is joined with a space, the font is scaled by
    /// [`EXPORT_FONT_SCALE`] and a near-transparent text color is drawn opaque.
    pub fn bubble_text(&mut self, data: &BubbleData, bounds: Size) -> Result<RasterImage> {
        let text = data.display_text();
        self.rasterize(&TextRequest {
            text: &text,
            font: data.style.font(),
            font_size: data.style.font_size * EXPORT_FONT_SCALE,
            color: legible_text_color(data.style.text_color),
            alignment: data.style.text_alignment,
            overflow: TextOverflow::WordWrap,
            bounds,
        })
    }

    /// Rasterize an arrow label: 14 pt, centered, truncated to one line
    pub fn arrow_label(&mut self, label: &str) -> Result<RasterImage> {
        self.rasterize(&TextRequest {
            text: label,
            font: FontKeyword::System,
            font_size: LABEL_FONT_SIZE,
            color: RgbaColor::BLACK,
            alignment: TextAlignment::Center,
            overflow: TextOverflow::TruncateTail,
            bounds: ARROW_LABEL_SIZE,
        })
    }

    /// Rasterize a request into a fresh pixmap
    pub fn rasterize(&mut self, request: &TextRequest<'_>) -> Result<RasterImage> {
        let width = (request.bounds.width * SUPERSAMPLE) as u32;
        let height = (request.bounds.height * SUPERSAMPLE) as u32;
        let empty = || RasterError::EmptyBounds {
            width: request.bounds.width,
            height: request.bounds.height,
        };
        if !request.bounds.is_positive() || width == 0 || height == 0 {
            return Err(empty());
        }
        let mut pixmap = Pixmap::new(width, height).ok_or_else(empty)?;

        if !request.text.trim().is_empty() {
            let family = self.resolve_family(&request.font);
            let font_px = ((request.font_size * SUPERSAMPLE) as f32).max(1.0);
            let text = match request.overflow {
                TextOverflow::WordWrap => request.text.to_string(),
                TextOverflow::TruncateTail => {
                    self.truncate_tail(request.text, &family, font_px, width as f32)
                }
            };
            let buffer = self.shape(&text, &family, font_px, request, width as f32, height as f32);
            let color = request.color.to_rgba8();
            let color = CosmicColor::rgba(color[0], color[1], color[2], color[3]);
            draw_buffer(&buffer, &mut self.font_system, &mut self.swash_cache, color, &mut pixmap);
        }

        Ok(RasterImage {
            pixmap,
            logical_size: request.bounds,
        })
    }

    fn shape(
        &mut self,
        text: &str,
        family: &FamilyChoice,
        font_px: f32,
        request: &TextRequest<'_>,
        width: f32,
        height: f32,
    ) -> Buffer {
        let metrics = Metrics::new(font_px, font_px * LINE_HEIGHT_FACTOR);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let wrap = match request.overflow {
            TextOverflow::WordWrap => Wrap::Word,
            TextOverflow::TruncateTail => Wrap::None,
        };
        buffer.set_wrap(&mut self.font_system, wrap);
        buffer.set_size(&mut self.font_system, Some(width), Some(height));
        let align = match request.alignment {
            TextAlignment::Leading => Align::Left,
            TextAlignment::Center => Align::Center,
            TextAlignment::Trailing => Align::Right,
        };
        let attrs = Attrs::new().family(family.as_family());
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, Some(align));
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    fn line_width(&mut self, text: &str, family: &FamilyChoice, font_px: f32) -> f32 {
        let metrics = Metrics::new(font_px, font_px * LINE_HEIGHT_FACTOR);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_wrap(&mut self.font_system, Wrap::None);
        let attrs = Attrs::new().family(family.as_family());
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer.layout_runs().map(|run| run.line_w).fold(0.0, f32::max)
    }

    /// Cut `text` so it fits `max_width`, ending with an ellipsis when cut
    fn truncate_tail(&mut self, text: &str, family: &FamilyChoice, font_px: f32, max_width: f32) -> String {
        let single_line: String = text.lines().next().unwrap_or_default().to_string();
        if self.line_width(&single_line, family, font_px) <= max_width {
            return single_line;
        }
        let chars: Vec<char> = single_line.chars().collect();
        for keep in (0..chars.len()).rev() {
            let candidate: String = chars[..keep].iter().collect::<String>().trim_end().to_string() + "…";
            if self.line_width(&candidate, family, font_px) <= max_width {
                return candidate;
            }
        }
        "…".to_string()
    }

    /// Map a font keyword onto a face family, falling back to the default
    /// sans-serif family when a named font is not installed
    fn resolve_family(&self, font: &FontKeyword<'_>) -> FamilyChoice {
        match font {
            FontKeyword::System | FontKeyword::Rounded => FamilyChoice::SansSerif,
            FontKeyword::Serif => FamilyChoice::Serif,
            FontKeyword::Mono => FamilyChoice::Monospace,
            FontKeyword::Named(name) => {
                let installed = self.font_system.db().faces().any(|face| {
                    face.families
                        .iter()
                        .any(|(family, _)| family.eq_ignore_ascii_case(name))
                });
                if installed {
                    FamilyChoice::Named((*name).to_string())
                } else {
                    tracing::debug!("Font '{}' not installed, using default", name);
                    FamilyChoice::SansSerif
                }
            }
        }
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned counterpart of [`Family`]
#[derive(Debug, Clone, PartialEq, Eq)]
enum FamilyChoice {
    SansSerif,
    Serif,
    Monospace,
    Named(String),
}

impl FamilyChoice {
    fn as_family(&self) -> Family<'_> {
        match self {
            Self::SansSerif => Family::SansSerif,
            Self::Serif => Family::Serif,
            Self::Monospace => Family::Monospace,
            Self::Named(name) => Family::Name(name.as_str()),
        }
    }
}

/// Blend every glyph coverage run of `buffer` into `pixmap`
fn draw_buffer(
    buffer: &Buffer,
    font_system: &mut FontSystem,
    swash_cache: &mut SwashCache,
    color: CosmicColor,
    pixmap: &mut Pixmap,
) {
    let mut paint = Paint {
        anti_alias: false,
        ..Paint::default()
    };
    buffer.draw(font_system, swash_cache, color, |x, y, w, h, c| {
        if c.a() == 0 {
            return;
        }
        let Some(rect) = tiny_skia::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        paint.set_color_rgba8(c.r(), c.g(), c.b(), c.a());
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_sequencer::{AnnotationItem, BubbleStyle};

    fn request(text: &str, bounds: Size) -> TextRequest<'_> {
        TextRequest {
            text,
            font: FontKeyword::System,
            font_size: 16.0,
            color: RgbaColor::BLACK,
            alignment: TextAlignment::Leading,
            overflow: TextOverflow::WordWrap,
            bounds,
        }
    }

    #[test]
    fn test_output_is_supersampled() {
        let mut rasterizer = TextRasterizer::new();
        let image = rasterizer.rasterize(&request("Hello", Size::new(120.5, 40.0))).unwrap();
        assert_eq!(image.width(), 241);
        assert_eq!(image.height(), 80);
        assert_eq!(image.logical_size(), Size::new(120.5, 40.0));
        assert_eq!(image.data().len(), 241 * 80 * 4);
    }

    #[test]
    fn test_empty_text_is_blank_not_error() {
        let mut rasterizer = TextRasterizer::new();
        let image = rasterizer.rasterize(&request("", Size::new(50.0, 20.0))).unwrap();
        assert!(image.is_blank());
        let image = rasterizer.rasterize(&request(" ", Size::new(50.0, 20.0))).unwrap();
        assert!(image.is_blank());
    }

    #[test]
    fn test_empty_bounds_rejected() {
        let mut rasterizer = TextRasterizer::new();
        assert!(matches!(
            rasterizer.rasterize(&request("Hi", Size::new(0.0, 20.0))),
            Err(RasterError::EmptyBounds { .. })
        ));
        assert!(rasterizer.rasterize(&request("Hi", Size::new(0.2, 20.0))).is_err());
    }

    #[test]
    fn test_text_draws_ink_when_fonts_exist() {
        let mut rasterizer = TextRasterizer::new();
        if !rasterizer.has_fonts() {
            return;
        }
        let image = rasterizer.rasterize(&request("Hello", Size::new(120.0, 40.0))).unwrap();
        assert!(!image.is_blank());
    }

    #[test]
    fn test_bubble_text_uses_content_bounds() {
        let mut rasterizer = TextRasterizer::new();
        let item = AnnotationItem::bubble(0.0, 3.0);
        let data = item.content.as_bubble().unwrap();
        let image = rasterizer.bubble_text(data, Size::new(100.0, 30.0)).unwrap();
        assert_eq!((image.width(), image.height()), (200, 60));
    }

    #[test]
    fn test_transparent_text_color_is_forced_opaque() {
        let mut rasterizer = TextRasterizer::new();
        if !rasterizer.has_fonts() {
            return;
        }
        let mut item = AnnotationItem::bubble(0.0, 3.0);
        if let bubble_annotate_sequencer::AnnotationContent::Bubble(data) = &mut item.content {
            data.style = BubbleStyle {
                text_color: RgbaColor::new(0.0, 0.0, 0.0, 0.0),
                ..BubbleStyle::soft()
            };
        }
        let data = item.content.as_bubble().unwrap();
        let image = rasterizer.bubble_text(data, Size::new(200.0, 60.0)).unwrap();
        assert!(!image.is_blank());
    }

    #[test]
    fn test_arrow_label_fixed_size() {
        let mut rasterizer = TextRasterizer::new();
        let image = rasterizer
            .arrow_label("A rather long label that cannot possibly fit in the box")
            .unwrap();
        assert_eq!((image.width(), image.height()), (200, 40));
    }

    #[test]
    fn test_unknown_named_font_falls_back() {
        let rasterizer = TextRasterizer::new();
        assert_eq!(
            rasterizer.resolve_family(&FontKeyword::Named("Definitely Not A Font 9000")),
            FamilyChoice::SansSerif
        );
        assert_eq!(rasterizer.resolve_family(&FontKeyword::Mono), FamilyChoice::Monospace);
    }

    #[test]
    fn test_png_encoding() {
        let mut rasterizer = TextRasterizer::new();
        let image = rasterizer.rasterize(&request("PNG", Size::new(30.0, 10.0))).unwrap();
        let png = image.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
