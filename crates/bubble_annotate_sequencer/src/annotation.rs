// SPDX-License-Identifier: MIT OR Apache-2.0
//! Annotation entities and their normalized geometry.
//!
//! All geometry is normalized to the video frame: `x` runs from the left edge,
//! `y` runs from the *bottom* edge. Conversion to pixels lives in the overlay
//! layout engine.

use crate::style::{ArrowStyle, BubbleStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Shortest time range an annotation may cover, in seconds
pub const MIN_DURATION: f64 = 0.2;

/// Duration given to annotations created at the playhead, in seconds
pub const DEFAULT_DURATION: f64 = 3.0;

/// Unique identifier for an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    /// Create a new random annotation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Text bubble
    Bubble,
    /// Directional arrow
    Arrow,
}

impl AnnotationKind {
    /// Get the display name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bubble => "Bubble",
            Self::Arrow => "Arrow",
        }
    }
}

/// Temporal and ordering record shared by every annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique annotation ID
    pub id: AnnotationId,
    /// Kind, always equal to the kind of the attached content
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    /// Stacking order, lower values are drawn first
    #[serde(default)]
    pub z_index: i32,
}

impl Annotation {
    /// Create a new annotation covering `[start_time, end_time]`
    pub fn new(kind: AnnotationKind, start_time: f64, end_time: f64) -> Self {
        let mut annotation = Self {
            id: AnnotationId::new(),
            kind,
            start_time,
            end_time,
            z_index: 0,
        };
        annotation.clamp_duration();
        annotation
    }

    /// Visible duration, never shorter than [`MIN_DURATION`]
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(MIN_DURATION)
    }

    /// Extend the end time so the range covers at least [`MIN_DURATION`]
    pub fn clamp_duration(&mut self) {
        if self.end_time - self.start_time < MIN_DURATION {
            self.end_time = self.start_time + MIN_DURATION;
        }
    }

    /// Whether the annotation is shown at `time` (inclusive on both ends)
    pub fn is_visible_at(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Whether the annotation overlaps the open range `(start, end)`
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.end_time > start && self.start_time < end
    }
}

/// Bubble placement: origin at the bubble's bottom-left corner, `y` from the bottom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleGeometry {
    /// Left edge, fraction of frame width
    pub origin_x: f64,
    /// Bottom edge, fraction of frame height measured from the bottom
    pub origin_y: f64,
    /// Width, fraction of frame width
    pub width: f64,
    /// Height, fraction of frame height
    pub height: f64,
}

impl BubbleGeometry {
    /// Create a new bubble geometry
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self { origin_x, origin_y, width, height }
    }
}

impl Default for BubbleGeometry {
    fn default() -> Self {
        Self::new(0.15, 0.2, 0.22, 0.12)
    }
}

/// Arrow placement, both endpoints with `y` from the bottom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowGeometry {
    /// Tail x
    pub start_x: f64,
    /// Tail y (from bottom)
    pub start_y: f64,
    /// Head x
    pub end_x: f64,
    /// Head y (from bottom)
    pub end_y: f64,
}

impl ArrowGeometry {
    /// Create a new arrow geometry
    pub fn new(start_x: f64, start_y: f64, end_x: f64, end_y: f64) -> Self {
        Self { start_x, start_y, end_x, end_y }
    }
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        Self::new(0.2, 0.3, 0.8, 0.5)
    }
}

/// Bubble payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleData {
    /// Caption text
    pub text: String,
    /// Placement
    pub geometry: BubbleGeometry,
    /// Presentation
    pub style: BubbleStyle,
    /// Optional glyph shown before the text, joined by a single space
    #[serde(default)]
    pub leading_emoji: Option<String>,
}

impl BubbleData {
    /// Text as it is drawn: leading glyph, a space, then the caption.
    ///
    /// Never empty; an empty caption becomes a single space.
    pub fn display_text(&self) -> String {
        let text = match &self.leading_emoji {
            Some(emoji) => format!("{emoji} {}", self.text),
            None => self.text.clone(),
        };
        if text.is_empty() {
            " ".to_string()
        } else {
            text
        }
    }
}

/// Arrow payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowData {
    /// Placement
    pub geometry: ArrowGeometry,
    /// Presentation
    pub style: ArrowStyle,
    /// Optional label drawn at the shaft midpoint
    #[serde(default)]
    pub label: Option<String>,
}

impl ArrowData {
    /// Label text when present and non-empty
    pub fn visible_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.is_empty())
    }
}

/// Annotation payload, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContentRecord", into = "ContentRecord")]
pub enum AnnotationContent {
    /// Text bubble
    Bubble(BubbleData),
    /// Arrow
    Arrow(ArrowData),
}

impl AnnotationContent {
    /// Kind of this content
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Bubble(_) => AnnotationKind::Bubble,
            Self::Arrow(_) => AnnotationKind::Arrow,
        }
    }

    /// Bubble payload if this is a bubble
    pub fn as_bubble(&self) -> Option<&BubbleData> {
        match self {
            Self::Bubble(data) => Some(data),
            Self::Arrow(_) => None,
        }
    }

    /// Arrow payload if this is an arrow
    pub fn as_arrow(&self) -> Option<&ArrowData> {
        match self {
            Self::Arrow(data) => Some(data),
            Self::Bubble(_) => None,
        }
    }
}

/// On-disk shape of [`AnnotationContent`]: `{"type": "bubble", "bubble": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentRecord {
    #[serde(rename = "type")]
    kind: AnnotationKind,
    #[serde(default)]
    bubble: Option<BubbleData>,
    #[serde(default)]
    arrow: Option<ArrowData>,
}

/// Content record whose payload is missing for its declared kind
#[derive(Debug, Clone, Copy)]
pub struct MissingPayload(AnnotationKind);

impl fmt::Display for MissingPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content of type {:?} has no matching payload", self.0)
    }
}

impl TryFrom<ContentRecord> for AnnotationContent {
    type Error = MissingPayload;

    fn try_from(record: ContentRecord) -> Result<Self, Self::Error> {
        match (record.kind, record.bubble, record.arrow) {
            (AnnotationKind::Bubble, Some(data), _) => Ok(Self::Bubble(data)),
            (AnnotationKind::Arrow, _, Some(data)) => Ok(Self::Arrow(data)),
            (kind, _, _) => Err(MissingPayload(kind)),
        }
    }
}

impl From<AnnotationContent> for ContentRecord {
    fn from(content: AnnotationContent) -> Self {
        match content {
            AnnotationContent::Bubble(data) => Self {
                kind: AnnotationKind::Bubble,
                bubble: Some(data),
                arrow: None,
            },
            AnnotationContent::Arrow(data) => Self {
                kind: AnnotationKind::Arrow,
                bubble: None,
                arrow: Some(data),
            },
        }
    }
}

/// An annotation with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationItem {
    /// Timing and ordering
    pub annotation: Annotation,
    /// Payload
    pub content: AnnotationContent,
}

impl AnnotationItem {
    /// Create a bubble with the default caption, geometry and soft preset
    pub fn bubble(start: f64, end: f64) -> Self {
        Self::bubble_with(start, end, "New bubble", BubbleGeometry::default(), BubbleStyle::soft())
    }

    /// Create a bubble with explicit caption, geometry and style
    pub fn bubble_with(
        start: f64,
        end: f64,
        text: impl Into<String>,
        geometry: BubbleGeometry,
        style: BubbleStyle,
    ) -> Self {
        Self {
            annotation: Annotation::new(AnnotationKind::Bubble, start, end),
            content: AnnotationContent::Bubble(BubbleData {
                text: text.into(),
                geometry,
                style,
                leading_emoji: None,
            }),
        }
    }

    /// Create an arrow with the default geometry and style
    pub fn arrow(start: f64, end: f64) -> Self {
        Self::arrow_with(start, end, ArrowGeometry::default(), ArrowStyle::default(), None)
    }

    /// Create an arrow with explicit geometry, style and label
    pub fn arrow_with(
        start: f64,
        end: f64,
        geometry: ArrowGeometry,
        style: ArrowStyle,
        label: Option<String>,
    ) -> Self {
        Self {
            annotation: Annotation::new(AnnotationKind::Arrow, start, end),
            content: AnnotationContent::Arrow(ArrowData { geometry, style, label }),
        }
    }

    /// Set the stacking order
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.annotation.z_index = z_index;
        self
    }

    /// Annotation ID
    pub fn id(&self) -> AnnotationId {
        self.annotation.id
    }

    /// Whether the annotation's kind matches its payload
    pub fn is_consistent(&self) -> bool {
        self.annotation.kind == self.content.kind()
    }
}
