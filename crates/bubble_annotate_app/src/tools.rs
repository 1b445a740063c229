// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive overlay tools: hit testing, drag handles and timeline clip drags.
//!
//! Pointer positions are in the same pixel space as the preview destination
//! rectangle. Every drag measures its translation from the pointer-down
//! position and applies it to the geometry captured at that moment.

use crate::state::{EditorState, Result};
use bubble_annotate_overlay::layout::{self, Point, Rect, Size};
use bubble_annotate_sequencer::{
    AnnotationContent, AnnotationId, AnnotationItem, ArrowGeometry, BubbleGeometry, FrameClock,
};

/// Side length of a bubble corner handle
pub const CORNER_HANDLE_SIZE: f64 = 12.0;
/// Extra grab margin around a corner handle
pub const CORNER_HANDLE_SLOP: f64 = 10.0;
/// Edge handle size (long side, short side)
pub const EDGE_HANDLE_SIZE: Size = Size::new(24.0, 4.0);
/// Extra grab margin around an edge handle
pub const EDGE_HANDLE_SLOP: f64 = 5.0;
/// Half width of the grab corridor around an arrow shaft
pub const ARROW_CORRIDOR: f64 = 18.0;
/// Grab radius around an arrow endpoint
pub const ARROW_ENDPOINT_RADIUS: f64 = 20.0;

/// Smallest normalized bubble width a resize may produce (exclusive)
pub const MIN_BUBBLE_WIDTH: f64 = 0.05;
/// Smallest normalized bubble height a resize may produce (exclusive)
pub const MIN_BUBBLE_HEIGHT: f64 = 0.03;

/// Resize handle on a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleHandle {
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
    /// Right edge
    Right,
}

impl BubbleHandle {
    /// All handles, corners first
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
    ];

    /// Get the name of this handle
    pub fn name(&self) -> &'static str {
        match self {
            Self::TopLeft => "Top Left",
            Self::TopRight => "Top Right",
            Self::BottomLeft => "Bottom Left",
            Self::BottomRight => "Bottom Right",
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }

    /// Whether this is a corner handle
    pub fn is_corner(&self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight)
    }

    /// Grab area of this handle on a bubble frame
    pub fn hit_rect(&self, frame: Rect) -> Rect {
        let center = match self {
            Self::TopLeft => Point::new(frame.x, frame.y),
            Self::TopRight => Point::new(frame.max_x(), frame.y),
            Self::BottomLeft => Point::new(frame.x, frame.max_y()),
            Self::BottomRight => Point::new(frame.max_x(), frame.max_y()),
            Self::Top => Point::new(frame.center().x, frame.y),
            Self::Bottom => Point::new(frame.center().x, frame.max_y()),
            Self::Left => Point::new(frame.x, frame.center().y),
            Self::Right => Point::new(frame.max_x(), frame.center().y),
        };
        let (size, slop) = match self {
            Self::Top | Self::Bottom => (EDGE_HANDLE_SIZE, EDGE_HANDLE_SLOP),
            Self::Left | Self::Right => (
                Size::new(EDGE_HANDLE_SIZE.height, EDGE_HANDLE_SIZE.width),
                EDGE_HANDLE_SLOP,
            ),
            _ => (Size::new(CORNER_HANDLE_SIZE, CORNER_HANDLE_SIZE), CORNER_HANDLE_SLOP),
        };
        Rect::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
        .outset(slop)
    }
}

/// Arrow endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHandle {
    /// Tail
    Start,
    /// Head
    End,
}

/// What a pointer-down landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Inside a bubble
    BubbleBody(AnnotationId),
    /// On a resize handle of the selected bubble
    BubbleHandle(AnnotationId, BubbleHandle),
    /// Near an arrow shaft
    ArrowBody(AnnotationId),
    /// On an endpoint of the selected arrow
    ArrowEndpoint(AnnotationId, ArrowHandle),
}

impl HitTarget {
    /// Annotation that was hit
    pub fn id(&self) -> AnnotationId {
        match *self {
            Self::BubbleBody(id)
            | Self::BubbleHandle(id, _)
            | Self::ArrowBody(id)
            | Self::ArrowEndpoint(id, _) => id,
        }
    }
}

/// Find what is under `point`, topmost annotation first.
///
/// Only annotations visible at `now` are considered. Handles exist only on
/// the selected annotation.
pub fn hit_test(
    items: &[&AnnotationItem],
    now: f64,
    dest: Rect,
    point: Point,
    selected: Option<AnnotationId>,
) -> Option<HitTarget> {
    let mut visible: Vec<&AnnotationItem> = items
        .iter()
        .rev()
        .copied()
        .filter(|item| item.annotation.is_visible_at(now))
        .collect();
    // Later items win ties
    visible.sort_by_key(|item| std::cmp::Reverse(item.annotation.z_index));

    visible.into_iter().find_map(|item| {
        let id = item.id();
        let is_selected = selected == Some(id);
        match &item.content {
            AnnotationContent::Bubble(data) => {
                let frame = layout::bubble_frame(&data.geometry, dest);
                if is_selected {
                    if let Some(handle) = BubbleHandle::ALL
                        .into_iter()
                        .find(|handle| handle.hit_rect(frame).contains(point))
                    {
                        return Some(HitTarget::BubbleHandle(id, handle));
                    }
                }
                frame.contains(point).then_some(HitTarget::BubbleBody(id))
            }
            AnnotationContent::Arrow(data) => {
                let path = layout::arrow_path(&data.geometry, dest);
                if is_selected {
                    if point.distance(path.start) <= ARROW_ENDPOINT_RADIUS {
                        return Some(HitTarget::ArrowEndpoint(id, ArrowHandle::Start));
                    }
                    if point.distance(path.end) <= ARROW_ENDPOINT_RADIUS {
                        return Some(HitTarget::ArrowEndpoint(id, ArrowHandle::End));
                    }
                }
                (path.distance_to(point) <= ARROW_CORRIDOR).then_some(HitTarget::ArrowBody(id))
            }
        }
    })
}

/// Move a bubble by a pixel translation; not clamped
pub fn move_bubble(original: &BubbleGeometry, translation: Point, size: Size) -> BubbleGeometry {
    BubbleGeometry {
        origin_x: original.origin_x + translation.x / size.width,
        origin_y: original.origin_y - translation.y / size.height,
        ..*original
    }
}

/// Resize a bubble by dragging `handle`.
///
/// Returns `None` when the result would be too small or push a moving edge
/// out of the frame.
pub fn resize_bubble(
    original: &BubbleGeometry,
    handle: BubbleHandle,
    translation: Point,
    size: Size,
) -> Option<BubbleGeometry> {
    let dx = translation.x / size.width;
    // Normalized y grows upward
    let dy = -translation.y / size.height;
    let BubbleGeometry {
        origin_x: ox,
        origin_y: oy,
        width: w,
        height: h,
    } = *original;

    let (x, y, width, height) = match handle {
        BubbleHandle::TopLeft => (ox + dx, oy, w - dx, h + dy),
        BubbleHandle::TopRight => (ox, oy, w + dx, h + dy),
        BubbleHandle::BottomLeft => (ox + dx, oy + dy, w - dx, h - dy),
        BubbleHandle::BottomRight => (ox, oy + dy, w + dx, h - dy),
        BubbleHandle::Top => (ox, oy, w, h + dy),
        BubbleHandle::Bottom => (ox, oy + dy, w, h - dy),
        BubbleHandle::Left => (ox + dx, oy, w - dx, h),
        BubbleHandle::Right => (ox, oy, w + dx, h),
    };

    let moves_left = matches!(handle, BubbleHandle::TopLeft | BubbleHandle::BottomLeft | BubbleHandle::Left);
    let moves_right = matches!(handle, BubbleHandle::TopRight | BubbleHandle::BottomRight | BubbleHandle::Right);
    let moves_top = matches!(handle, BubbleHandle::TopLeft | BubbleHandle::TopRight | BubbleHandle::Top);
    let moves_bottom = matches!(handle, BubbleHandle::BottomLeft | BubbleHandle::BottomRight | BubbleHandle::Bottom);

    let valid = width > MIN_BUBBLE_WIDTH
        && height > MIN_BUBBLE_HEIGHT
        && (!moves_left || x >= 0.0)
        && (!moves_right || x + width <= 1.0)
        && (!moves_top || y + height <= 1.0)
        && (!moves_bottom || y >= 0.0);
    valid.then_some(BubbleGeometry::new(x, y, width, height))
}

/// Move a whole arrow by a pixel translation, clamping every coordinate to `0..=1`
pub fn move_arrow(original: &ArrowGeometry, translation: Point, size: Size) -> ArrowGeometry {
    let dx = translation.x / size.width;
    let dy = -translation.y / size.height;
    ArrowGeometry {
        start_x: (original.start_x + dx).clamp(0.0, 1.0),
        start_y: (original.start_y + dy).clamp(0.0, 1.0),
        end_x: (original.end_x + dx).clamp(0.0, 1.0),
        end_y: (original.end_y + dy).clamp(0.0, 1.0),
    }
}

/// Drag one arrow endpoint; the pointer maps back through the layout, clamped
pub fn drag_arrow_endpoint(
    original: &ArrowGeometry,
    handle: ArrowHandle,
    translation: Point,
    dest: Rect,
) -> ArrowGeometry {
    let path = layout::arrow_path(original, dest);
    let base = match handle {
        ArrowHandle::Start => path.start,
        ArrowHandle::End => path.end,
    };
    let (nx, ny) = layout::to_normalized(Point::new(base.x + translation.x, base.y + translation.y), dest);
    match handle {
        ArrowHandle::Start => ArrowGeometry {
            start_x: nx,
            start_y: ny,
            ..*original
        },
        ArrowHandle::End => ArrowGeometry {
            end_x: nx,
            end_y: ny,
            ..*original
        },
    }
}

/// Active overlay drag
#[derive(Debug, Clone, PartialEq)]
pub enum DragOperation {
    /// Moving a bubble
    MoveBubble {
        /// Dragged bubble
        id: AnnotationId,
        /// Geometry at pointer-down
        original: BubbleGeometry,
    },
    /// Resizing a bubble
    ResizeBubble {
        /// Dragged bubble
        id: AnnotationId,
        /// Grabbed handle
        handle: BubbleHandle,
        /// Geometry at pointer-down
        original: BubbleGeometry,
    },
    /// Moving a whole arrow
    MoveArrow {
        /// Dragged arrow
        id: AnnotationId,
        /// Geometry at pointer-down
        original: ArrowGeometry,
    },
    /// Dragging one arrow endpoint
    ArrowEndpoint {
        /// Dragged arrow
        id: AnnotationId,
        /// Grabbed endpoint
        handle: ArrowHandle,
        /// Geometry at pointer-down
        original: ArrowGeometry,
    },
}

impl DragOperation {
    /// Annotation being dragged
    pub fn id(&self) -> AnnotationId {
        match self {
            Self::MoveBubble { id, .. }
            | Self::ResizeBubble { id, .. }
            | Self::MoveArrow { id, .. }
            | Self::ArrowEndpoint { id, .. } => *id,
        }
    }

    /// Undo description of this drag
    pub fn description(&self) -> &'static str {
        match self {
            Self::MoveBubble { .. } => "Move bubble",
            Self::ResizeBubble { .. } => "Resize bubble",
            Self::MoveArrow { .. } => "Move arrow",
            Self::ArrowEndpoint { .. } => "Move arrow endpoint",
        }
    }
}

/// Turns pointer gestures over the preview into geometry edits
#[derive(Debug, Clone, Default)]
pub struct OverlayController {
    drag: Option<(DragOperation, Point, Rect)>,
}

impl OverlayController {
    /// Create a new controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drag, if any
    pub fn active_drag(&self) -> Option<&DragOperation> {
        self.drag.as_ref().map(|(operation, _, _)| operation)
    }

    /// Pointer pressed: select what was hit and start a drag on it.
    ///
    /// Pressing empty space clears the selection.
    pub fn pointer_down(&mut self, state: &mut EditorState, point: Point, dest: Rect) -> Result<Option<HitTarget>> {
        let now = state.playback.time;
        let items: Vec<&AnnotationItem> = state.timeline().iter().collect();
        let hit = hit_test(&items, now, dest, point, state.selection);
        let Some(target) = hit else {
            state.select(None);
            self.drag = None;
            return Ok(None);
        };

        let operation = state
            .timeline()
            .get(target.id())
            .and_then(|item| drag_for_target(target, &item.content));
        state.select(Some(target.id()));
        if let Some(operation) = operation {
            state.begin_gesture(operation.description())?;
            self.drag = Some((operation, point, dest));
        }
        Ok(Some(target))
    }

    /// Pointer moved while pressed
    pub fn pointer_moved(&mut self, state: &mut EditorState, point: Point) -> Result<()> {
        let Some((operation, start, dest)) = &self.drag else {
            return Ok(());
        };
        let translation = Point::new(point.x - start.x, point.y - start.y);
        let size = dest.size();
        if !size.is_positive() {
            return Ok(());
        }
        match operation {
            DragOperation::MoveBubble { id, original } => {
                state.set_bubble_geometry(*id, move_bubble(original, translation, size))
            }
            DragOperation::ResizeBubble { id, handle, original } => {
                match resize_bubble(original, *handle, translation, size) {
                    Some(geometry) => state.set_bubble_geometry(*id, geometry),
                    None => Ok(()),
                }
            }
            DragOperation::MoveArrow { id, original } => {
                state.set_arrow_geometry(*id, move_arrow(original, translation, size))
            }
            DragOperation::ArrowEndpoint { id, handle, original } => {
                state.set_arrow_geometry(*id, drag_arrow_endpoint(original, *handle, translation, *dest))
            }
        }
    }

    /// Pointer released: the drag becomes one undo step
    pub fn pointer_up(&mut self, state: &mut EditorState) -> Result<()> {
        if self.drag.take().is_some() {
            state.end_gesture()?;
        }
        Ok(())
    }
}

fn drag_for_target(target: HitTarget, content: &AnnotationContent) -> Option<DragOperation> {
    match (target, content) {
        (HitTarget::BubbleBody(id), AnnotationContent::Bubble(data)) => Some(DragOperation::MoveBubble {
            id,
            original: data.geometry,
        }),
        (HitTarget::BubbleHandle(id, handle), AnnotationContent::Bubble(data)) => {
            Some(DragOperation::ResizeBubble {
                id,
                handle,
                original: data.geometry,
            })
        }
        (HitTarget::ArrowBody(id), AnnotationContent::Arrow(data)) => Some(DragOperation::MoveArrow {
            id,
            original: data.geometry,
        }),
        (HitTarget::ArrowEndpoint(id, handle), AnnotationContent::Arrow(data)) => {
            Some(DragOperation::ArrowEndpoint {
                id,
                handle,
                original: data.geometry,
            })
        }
        _ => None,
    }
}

/// Default timeline zoom in pixels per second
pub const DEFAULT_PIXELS_PER_SECOND: f64 = 120.0;
/// Minimum timeline zoom
pub const MIN_PIXELS_PER_SECOND: f64 = 50.0;
/// Maximum timeline zoom
pub const MAX_PIXELS_PER_SECOND: f64 = 500.0;
/// Zoom factor per zoom step
pub const ZOOM_STEP: f64 = 1.2;
/// Shortest clip a timeline resize leaves behind
pub const MIN_CLIP_DRAG_DURATION: f64 = 0.1;

/// Horizontal scale of the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineScale {
    /// Pixels per second
    pub pixels_per_second: f64,
}

impl Default for TimelineScale {
    fn default() -> Self {
        Self {
            pixels_per_second: DEFAULT_PIXELS_PER_SECOND,
        }
    }
}

impl TimelineScale {
    /// Zoom in one step
    pub fn zoom_in(&mut self) {
        self.pixels_per_second = (self.pixels_per_second * ZOOM_STEP).min(MAX_PIXELS_PER_SECOND);
    }

    /// Zoom out one step
    pub fn zoom_out(&mut self) {
        self.pixels_per_second = (self.pixels_per_second / ZOOM_STEP).max(MIN_PIXELS_PER_SECOND);
    }

    /// Convert time to x position
    pub fn time_to_x(&self, time: f64) -> f64 {
        time * self.pixels_per_second
    }

    /// Convert x position to time
    pub fn x_to_time(&self, x: f64) -> f64 {
        x / self.pixels_per_second
    }
}

/// What part of a clip is dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipDragKind {
    /// Whole clip
    Move,
    /// Start edge
    ResizeStart,
    /// End edge
    ResizeEnd,
}

/// Drag of an annotation clip on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipDrag {
    /// Dragged annotation
    pub id: AnnotationId,
    /// Dragged part
    pub kind: ClipDragKind,
    /// Start time at pointer-down
    pub original_start: f64,
    /// End time at pointer-down
    pub original_end: f64,
}

impl ClipDrag {
    /// Start dragging an annotation clip
    pub fn begin(item: &AnnotationItem, kind: ClipDragKind) -> Self {
        Self {
            id: item.id(),
            kind,
            original_start: item.annotation.start_time,
            original_end: item.annotation.end_time,
        }
    }

    /// New `(start, end)` for a horizontal pointer translation.
    ///
    /// Returns `None` when a start resize would leave less than
    /// [`MIN_CLIP_DRAG_DURATION`].
    pub fn apply(&self, dx: f64, scale: TimelineScale, clock: &FrameClock) -> Option<(f64, f64)> {
        let dt = scale.x_to_time(dx);
        match self.kind {
            ClipDragKind::Move => {
                let start = clock.snap_to_frame((self.original_start + dt).max(0.0));
                Some((start, start + (self.original_end - self.original_start)))
            }
            ClipDragKind::ResizeStart => {
                let start = clock.snap_to_frame((self.original_start + dt).max(0.0));
                (self.original_end - start >= MIN_CLIP_DRAG_DURATION).then_some((start, self.original_end))
            }
            ClipDragKind::ResizeEnd => {
                let end = (self.original_end + dt).max(self.original_start + MIN_CLIP_DRAG_DURATION);
                Some((self.original_start, clock.snap_to_frame(end)))
            }
        }
    }

    /// Apply a translation to the editor; rejected moves change nothing
    pub fn update(&self, state: &mut EditorState, dx: f64, scale: TimelineScale) -> Result<()> {
        match self.apply(dx, scale, &state.clock) {
            Some((start, end)) => state.set_time_range(self.id, start, end),
            None => Ok(()),
        }
    }
}
