// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presentation attributes for bubbles and arrows.
//!
//! Styles are plain values: editing one field means replacing the record.
//! Fields added after the first document version decode to their defaults when
//! absent.

use serde::{Deserialize, Serialize};

/// RGBA color with components in `0..=1`, alpha independent of the color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbaColor {
    /// Red
    pub red: f64,
    /// Green
    pub green: f64,
    /// Blue
    pub blue: f64,
    /// Alpha
    pub alpha: f64,
}

impl RgbaColor {
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Create a new color
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Same color with a different alpha
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// Components as 8-bit straight (non-premultiplied) RGBA
    pub fn to_rgba8(&self) -> [u8; 4] {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.red), channel(self.green), channel(self.blue), channel(self.alpha)]
    }
}

/// Background look a bubble style was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundPreset {
    /// Near-opaque white card
    #[default]
    Soft,
    /// Translucent card with hairline border
    Glass,
    /// Opaque colored card
    Solid,
}

impl BackgroundPreset {
    /// All presets in menu order
    pub const ALL: [Self; 3] = [Self::Soft, Self::Glass, Self::Solid];

    /// Get the display name of this preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::Soft => "Soft",
            Self::Glass => "Glass",
            Self::Solid => "Solid",
        }
    }

    /// The full style this preset stands for
    pub fn style(&self) -> BubbleStyle {
        match self {
            Self::Soft => BubbleStyle::soft(),
            Self::Glass => BubbleStyle::glass(),
            Self::Solid => BubbleStyle::solid(),
        }
    }
}

/// Horizontal text alignment inside a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlignment {
    /// Left
    #[default]
    Leading,
    /// Centered
    Center,
    /// Right
    Trailing,
}

/// Entrance or exit animation kind.
///
/// Stored and round-tripped; the export schedule always uses the opacity cut
/// and fade-out regardless of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BubbleAnimation {
    /// Appear instantly
    None,
    /// Fade
    #[default]
    Fade,
    /// Scale up from the center
    Scale,
    /// Slide in from below
    SlideUp,
    /// Slide in from above
    SlideDown,
}

/// Font keyword stored in [`BubbleStyle::font_name`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontKeyword<'a> {
    /// `""`: the system face
    System,
    /// `"rounded"`
    Rounded,
    /// `"serif"`
    Serif,
    /// `"mono"`
    Mono,
    /// Any other value: a font family name
    Named(&'a str),
}

impl<'a> FontKeyword<'a> {
    /// Parse a stored font name
    pub fn parse(name: &'a str) -> Self {
        match name {
            "" => Self::System,
            "rounded" => Self::Rounded,
            "serif" => Self::Serif,
            "mono" => Self::Mono,
            other => Self::Named(other),
        }
    }
}

fn default_border_color() -> RgbaColor {
    RgbaColor::new(0.5, 0.5, 0.5, 0.5)
}

fn default_text_color() -> RgbaColor {
    RgbaColor::BLACK
}

/// Bubble presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleStyle {
    /// Fill color
    pub background_color: RgbaColor,
    /// Border color
    #[serde(default = "default_border_color")]
    pub border_color: RgbaColor,
    /// Border width in pixels, `0` for no border
    #[serde(default)]
    pub border_width: f64,
    /// Corner radius in pixels
    pub corner_radius: f64,
    /// Inset between the bubble edge and its text, in pixels
    pub padding: f64,
    /// Font size in points at preview scale
    pub font_size: f64,
    /// Font keyword, see [`FontKeyword`]
    #[serde(default)]
    pub font_name: String,
    /// Text color
    #[serde(default = "default_text_color")]
    pub text_color: RgbaColor,
    /// Text alignment
    #[serde(default)]
    pub text_alignment: TextAlignment,
    /// Shadow opacity
    pub shadow_opacity: f64,
    /// Shadow blur radius in pixels
    pub shadow_radius: f64,
    /// Shadow drop in pixels (positive moves the shadow down)
    pub shadow_offset_y: f64,
    /// Preset this style was derived from
    pub background_preset: BackgroundPreset,
    /// Entrance animation
    pub entrance_animation: BubbleAnimation,
    /// Exit animation
    pub exit_animation: BubbleAnimation,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            background_color: RgbaColor::new(1.0, 1.0, 1.0, 0.95),
            border_color: default_border_color(),
            border_width: 0.0,
            corner_radius: 12.0,
            padding: 12.0,
            font_size: 16.0,
            font_name: String::new(),
            text_color: default_text_color(),
            text_alignment: TextAlignment::Leading,
            shadow_opacity: 0.2,
            shadow_radius: 8.0,
            shadow_offset_y: 2.0,
            background_preset: BackgroundPreset::Soft,
            entrance_animation: BubbleAnimation::Fade,
            exit_animation: BubbleAnimation::Fade,
        }
    }
}

impl BubbleStyle {
    /// Near-opaque white card, the default for new bubbles
    pub fn soft() -> Self {
        Self {
            background_color: RgbaColor::new(1.0, 1.0, 1.0, 0.95),
            corner_radius: 14.0,
            padding: 14.0,
            font_size: 17.0,
            shadow_opacity: 0.15,
            shadow_radius: 10.0,
            ..Self::default()
        }
    }

    /// Translucent card with a hairline border
    pub fn glass() -> Self {
        Self {
            background_color: RgbaColor::new(1.0, 1.0, 1.0, 0.75),
            border_width: 0.5,
            corner_radius: 16.0,
            padding: 12.0,
            font_size: 16.0,
            shadow_opacity: 0.1,
            shadow_radius: 12.0,
            background_preset: BackgroundPreset::Glass,
            entrance_animation: BubbleAnimation::Scale,
            ..Self::default()
        }
    }

    /// Opaque blue card with white text
    pub fn solid() -> Self {
        Self {
            background_color: RgbaColor::new(0.2, 0.4, 0.9, 1.0),
            border_color: RgbaColor::new(0.1, 0.2, 0.6, 1.0),
            border_width: 1.0,
            corner_radius: 10.0,
            padding: 12.0,
            font_size: 16.0,
            text_color: RgbaColor::WHITE,
            shadow_opacity: 0.25,
            shadow_radius: 6.0,
            background_preset: BackgroundPreset::Solid,
            entrance_animation: BubbleAnimation::SlideUp,
            ..Self::default()
        }
    }

    /// Parsed font keyword
    pub fn font(&self) -> FontKeyword<'_> {
        FontKeyword::parse(&self.font_name)
    }

    /// Set the font size
    #[must_use]
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Set the text alignment
    #[must_use]
    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = alignment;
        self
    }
}

/// Arrow presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrowStyle {
    /// Stroke width in pixels
    pub thickness: f64,
    /// Length of each arrowhead stroke in pixels
    pub head_size: f64,
    /// Whether the shaft is dashed
    pub is_dashed: bool,
    /// Dash and gap length in pixels
    pub dash_length: f64,
    /// Stroke color
    pub color: RgbaColor,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            thickness: 3.0,
            head_size: 12.0,
            is_dashed: false,
            dash_length: 8.0,
            color: RgbaColor::new(1.0, 0.6, 0.0, 1.0),
        }
    }
}

impl ArrowStyle {
    /// Heavier stroke and larger head
    pub fn thick() -> Self {
        Self { thickness: 5.0, head_size: 16.0, ..Self::default() }
    }

    /// Dashed shaft
    pub fn dashed() -> Self {
        Self { is_dashed: true, dash_length: 10.0, ..Self::default() }
    }

    /// Red stroke
    pub fn red() -> Self {
        Self { color: RgbaColor::new(1.0, 0.2, 0.2, 1.0), ..Self::default() }
    }

    /// White stroke
    pub fn white() -> Self {
        Self { color: RgbaColor::WHITE, ..Self::default() }
    }

    /// Dash pattern (dash, gap) when the shaft is dashed
    pub fn dash_pattern(&self) -> Option<[f64; 2]> {
        (self.is_dashed && self.dash_length > 0.0).then_some([self.dash_length, self.dash_length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let solid = BubbleStyle::solid();
        assert_eq!(solid.text_color, RgbaColor::WHITE);
        assert_eq!(solid.border_width, 1.0);
        assert_eq!(solid.entrance_animation, BubbleAnimation::SlideUp);
        assert_eq!(solid.exit_animation, BubbleAnimation::Fade);

        let soft = BubbleStyle::soft();
        assert_eq!(soft.font_size, 17.0);
        assert_eq!(soft.shadow_offset_y, 2.0);

        for preset in BackgroundPreset::ALL {
            assert_eq!(preset.style().background_preset, preset);
        }
    }

    #[test]
    fn test_legacy_style_decodes_with_defaults() {
        let json = r#"{
            "backgroundColor": {"red": 1, "green": 1, "blue": 1, "alpha": 0.95},
            "cornerRadius": 14,
            "padding": 14,
            "fontSize": 17,
            "shadowOpacity": 0.15,
            "shadowRadius": 10,
            "shadowOffsetY": 2,
            "backgroundPreset": "soft",
            "entranceAnimation": "fade",
            "exitAnimation": "fade"
        }"#;
        let style: BubbleStyle = serde_json::from_str(json).unwrap();
        assert_eq!(style, BubbleStyle::soft());
        assert_eq!(style.border_color, RgbaColor::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(style.text_alignment, TextAlignment::Leading);
        assert_eq!(style.font(), FontKeyword::System);
    }

    #[test]
    fn test_animation_names() {
        let json = serde_json::to_string(&BubbleAnimation::SlideDown).unwrap();
        assert_eq!(json, "\"slideDown\"");
    }

    #[test]
    fn test_font_keywords() {
        assert_eq!(FontKeyword::parse("mono"), FontKeyword::Mono);
        assert_eq!(FontKeyword::parse("Avenir Next"), FontKeyword::Named("Avenir Next"));
    }

    #[test]
    fn test_arrow_dash_pattern() {
        assert_eq!(ArrowStyle::default().dash_pattern(), None);
        assert_eq!(ArrowStyle::dashed().dash_pattern(), Some([10.0, 10.0]));
    }

    #[test]
    fn test_rgba8() {
        assert_eq!(RgbaColor::new(1.0, 0.6, 0.0, 1.0).to_rgba8(), [255, 153, 0, 255]);
        assert_eq!(RgbaColor::new(2.0, -1.0, 0.5, 0.5).to_rgba8(), [255, 0, 128, 128]);
    }
}
