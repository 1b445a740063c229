// SPDX-License-Identifier: MIT OR Apache-2.0
//! Overlay layout engine.
//!
//! Maps normalized annotation geometry into pixels inside a destination
//! rectangle. The preview surface, the interactive controller and the export
//! overlay all call these functions; none of them repeat the arithmetic.
//!
//! Pixel space has its origin at the top-left with `y` growing downward.
//! Normalized space measures `y` from the bottom.

use bubble_annotate_sequencer::{AnnotationContent, ArrowGeometry, BubbleGeometry};

/// Point in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X
    pub x: f64,
    /// Y (down)
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are positive
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle in pixels, origin at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at the origin with the given size
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Size of the rectangle
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrink by `inset` on every side; the size never goes negative
    #[must_use]
    pub fn inset(&self, inset: f64) -> Self {
        Self::new(
            self.x + inset,
            self.y + inset,
            (self.width - 2.0 * inset).max(0.0),
            (self.height - 2.0 * inset).max(0.0),
        )
    }

    /// Grow by `outset` on every side
    #[must_use]
    pub fn outset(&self, outset: f64) -> Self {
        Self::new(
            self.x - outset,
            self.y - outset,
            self.width + 2.0 * outset,
            self.height + 2.0 * outset,
        )
    }

    /// Whether the point lies inside (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// Same rectangle in a local coordinate space whose origin is `origin`
    #[must_use]
    pub fn relative_to(&self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }
}

/// Arrow shaft in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowPath {
    /// Tail
    pub start: Point,
    /// Head
    pub end: Point,
}

impl ArrowPath {
    /// Direction of travel from tail to head, in radians
    pub fn angle(&self) -> f64 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }

    /// Shaft length
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Midpoint of the shaft
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// The two chevron strokes at the head, each running from the head outward.
    ///
    /// Each stroke is `head_size` long and sits 30 degrees off the shaft.
    pub fn head_strokes(&self, head_size: f64) -> [(Point, Point); 2] {
        let angle = self.angle();
        let barb = |offset: f64| {
            Point::new(
                self.end.x - head_size * (angle + offset).cos(),
                self.end.y - head_size * (angle + offset).sin(),
            )
        };
        [
            (self.end, barb(-std::f64::consts::FRAC_PI_6)),
            (self.end, barb(std::f64::consts::FRAC_PI_6)),
        ]
    }

    /// Distance from a point to the shaft segment
    pub fn distance_to(&self, point: Point) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let length_sq = dx * dx + dy * dy;
        if length_sq <= f64::EPSILON {
            return point.distance(self.start);
        }
        let t = (((point.x - self.start.x) * dx + (point.y - self.start.y) * dy) / length_sq)
            .clamp(0.0, 1.0);
        point.distance(Point::new(self.start.x + t * dx, self.start.y + t * dy))
    }
}

/// Pixel geometry of an annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelGeometry {
    /// Bubble frame
    Bubble(Rect),
    /// Arrow shaft
    Arrow(ArrowPath),
}

/// Width and height of the label box centered on an arrow's midpoint
pub const ARROW_LABEL_SIZE: Size = Size::new(100.0, 20.0);

/// Bubble frame inside `dest`
pub fn bubble_frame(geometry: &BubbleGeometry, dest: Rect) -> Rect {
    Rect::new(
        dest.x + geometry.origin_x * dest.width,
        dest.y + dest.height * (1.0 - geometry.origin_y - geometry.height),
        geometry.width * dest.width,
        geometry.height * dest.height,
    )
}

/// Map a normalized point (`y` from the bottom) into `dest`
pub fn to_pixels(nx: f64, ny: f64, dest: Rect) -> Point {
    Point::new(dest.x + nx * dest.width, dest.y + dest.height * (1.0 - ny))
}

/// Map a pixel point back to normalized coordinates, clamped to `0..=1`
pub fn to_normalized(point: Point, dest: Rect) -> (f64, f64) {
    if !dest.size().is_positive() {
        return (0.0, 0.0);
    }
    let nx = (point.x - dest.x) / dest.width;
    let ny = 1.0 - (point.y - dest.y) / dest.height;
    (nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}

/// Arrow shaft inside `dest`
pub fn arrow_path(geometry: &ArrowGeometry, dest: Rect) -> ArrowPath {
    ArrowPath {
        start: to_pixels(geometry.start_x, geometry.start_y, dest),
        end: to_pixels(geometry.end_x, geometry.end_y, dest),
    }
}

/// Pixel geometry of any annotation content inside `dest`
pub fn layout(content: &AnnotationContent, dest: Rect) -> PixelGeometry {
    match content {
        AnnotationContent::Bubble(data) => PixelGeometry::Bubble(bubble_frame(&data.geometry, dest)),
        AnnotationContent::Arrow(data) => PixelGeometry::Arrow(arrow_path(&data.geometry, dest)),
    }
}

/// Label box of an arrow, centered on the shaft midpoint
pub fn arrow_label_rect(path: &ArrowPath) -> Rect {
    let mid = path.midpoint();
    Rect::new(
        mid.x - ARROW_LABEL_SIZE.width / 2.0,
        mid.y - ARROW_LABEL_SIZE.height / 2.0,
        ARROW_LABEL_SIZE.width,
        ARROW_LABEL_SIZE.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_sequencer::AnnotationItem;

    #[test]
    fn test_bubble_frame_matches_manual_computation() {
        let geometry = BubbleGeometry::new(0.15, 0.2, 0.22, 0.12);
        let frame = bubble_frame(&geometry, Rect::new(0.0, 0.0, 1000.0, 500.0));
        assert!((frame.x - 150.0).abs() < 1e-9);
        assert!((frame.y - 340.0).abs() < 1e-9);
        assert!((frame.width - 220.0).abs() < 1e-9);
        assert!((frame.height - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let dest = Rect::new(12.5, 7.25, 1280.0, 720.0);
        for item in [AnnotationItem::bubble(0.0, 1.0), AnnotationItem::arrow(0.0, 1.0)] {
            assert_eq!(layout(&item.content, dest), layout(&item.content, dest));
        }
    }

    #[test]
    fn test_bubble_frame_respects_dest_offset() {
        let geometry = BubbleGeometry::new(0.0, 0.0, 1.0, 1.0);
        let dest = Rect::new(40.0, 30.0, 200.0, 100.0);
        assert_eq!(bubble_frame(&geometry, dest), dest);
    }

    #[test]
    fn test_arrow_endpoints_flip_y() {
        let geometry = ArrowGeometry::new(0.2, 0.3, 0.8, 0.5);
        let path = arrow_path(&geometry, Rect::new(0.0, 0.0, 1000.0, 500.0));
        assert!((path.start.x - 200.0).abs() < 1e-9);
        assert!((path.start.y - 350.0).abs() < 1e-9);
        assert!((path.end.x - 800.0).abs() < 1e-9);
        assert!((path.end.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_round_trip() {
        let dest = Rect::new(10.0, 20.0, 640.0, 360.0);
        let point = to_pixels(0.25, 0.75, dest);
        let (nx, ny) = to_normalized(point, dest);
        assert!((nx - 0.25).abs() < 1e-12);
        assert!((ny - 0.75).abs() < 1e-12);
        assert_eq!(to_normalized(Point::new(-50.0, 1000.0), dest), (0.0, 0.0));
    }

    #[test]
    fn test_head_strokes_horizontal() {
        let path = ArrowPath {
            start: Point::new(0.0, 0.0),
            end: Point::new(100.0, 0.0),
        };
        let [(a0, a1), (b0, b1)] = path.head_strokes(10.0);
        assert_eq!(a0, path.end);
        assert_eq!(b0, path.end);
        let cos30 = 30f64.to_radians().cos() * 10.0;
        assert!((a1.x - (100.0 - cos30)).abs() < 1e-9);
        assert!((a1.y - 5.0).abs() < 1e-9);
        assert!((b1.x - (100.0 - cos30)).abs() < 1e-9);
        assert!((b1.y + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_rect_centered() {
        let path = ArrowPath {
            start: Point::new(0.0, 0.0),
            end: Point::new(200.0, 100.0),
        };
        assert_eq!(arrow_label_rect(&path), Rect::new(50.0, 40.0, 100.0, 20.0));
    }

    #[test]
    fn test_distance_to_segment() {
        let path = ArrowPath {
            start: Point::new(0.0, 0.0),
            end: Point::new(100.0, 0.0),
        };
        assert_eq!(path.distance_to(Point::new(50.0, 10.0)), 10.0);
        assert_eq!(path.distance_to(Point::new(-30.0, 40.0)), 50.0);
    }

    #[test]
    fn test_rect_helpers() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(rect.inset(10.0), Rect::new(20.0, 20.0, 80.0, 30.0));
        assert_eq!(rect.inset(40.0).height, 0.0);
        assert!(rect.contains(Point::new(110.0, 60.0)));
        assert!(!rect.contains(Point::new(111.0, 60.0)));
        assert_eq!(rect.relative_to(Point::new(10.0, 10.0)).x, 0.0);
    }
}
