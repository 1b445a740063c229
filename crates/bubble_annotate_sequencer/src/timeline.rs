// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered annotation list and playback transport.

use crate::annotation::{AnnotationContent, AnnotationId, AnnotationItem, ArrowGeometry, BubbleGeometry};
use crate::clock::FrameClock;
use crate::style::{ArrowStyle, BubbleStyle};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from annotation list mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// No annotation with this ID
    #[error("Annotation {0} not found")]
    NotFound(AnnotationId),

    /// The edit would change content to a different kind than the annotation
    #[error("Annotation content does not match its kind")]
    KindMismatch,
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Annotations of a project, kept sorted by start time.
///
/// Every mutation goes through this type so the duration invariant and the
/// kind/content match hold after each call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AnnotationItem>", into = "Vec<AnnotationItem>")]
pub struct AnnotationTimeline {
    items: IndexMap<AnnotationId, AnnotationItem>,
}

impl AnnotationTimeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation on top of every existing one.
    ///
    /// The new item gets the next free z-index, then the list is re-sorted by
    /// start time.
    pub fn add(&mut self, mut item: AnnotationItem) -> AnnotationId {
        item.annotation.z_index = self.next_z_index();
        item.annotation.clamp_duration();
        let id = item.id();
        self.items.insert(id, item);
        self.sort();
        id
    }

    /// Remove an annotation
    pub fn remove(&mut self, id: AnnotationId) -> Option<AnnotationItem> {
        self.items.shift_remove(&id)
    }

    /// Edit an annotation in place.
    ///
    /// The duration invariant is re-applied afterwards. An edit that changes
    /// the kind of the content is rolled back.
    pub fn update<F>(&mut self, id: AnnotationId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut AnnotationItem),
    {
        let item = self.items.get_mut(&id).ok_or(TimelineError::NotFound(id))?;
        let before = item.clone();
        edit(item);
        item.annotation.id = id;
        if !item.is_consistent() {
            *item = before;
            return Err(TimelineError::KindMismatch);
        }
        item.annotation.clamp_duration();
        self.sort();
        Ok(())
    }

    /// Set the time range of an annotation
    pub fn set_time_range(&mut self, id: AnnotationId, start_time: f64, end_time: f64) -> Result<()> {
        self.update(id, |item| {
            item.annotation.start_time = start_time;
            item.annotation.end_time = end_time;
        })
    }

    /// Replace the geometry of a bubble
    pub fn set_bubble_geometry(&mut self, id: AnnotationId, geometry: BubbleGeometry) -> Result<()> {
        self.update_content(id, |content| match content {
            AnnotationContent::Bubble(data) => {
                data.geometry = geometry;
                true
            }
            AnnotationContent::Arrow(_) => false,
        })
    }

    /// Replace the style of a bubble
    pub fn set_bubble_style(&mut self, id: AnnotationId, style: BubbleStyle) -> Result<()> {
        self.update_content(id, |content| match content {
            AnnotationContent::Bubble(data) => {
                data.style = style;
                true
            }
            AnnotationContent::Arrow(_) => false,
        })
    }

    /// Replace the caption of a bubble
    pub fn set_bubble_text(&mut self, id: AnnotationId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.update_content(id, |content| match content {
            AnnotationContent::Bubble(data) => {
                data.text = text;
                true
            }
            AnnotationContent::Arrow(_) => false,
        })
    }

    /// Replace the geometry of an arrow
    pub fn set_arrow_geometry(&mut self, id: AnnotationId, geometry: ArrowGeometry) -> Result<()> {
        self.update_content(id, |content| match content {
            AnnotationContent::Arrow(data) => {
                data.geometry = geometry;
                true
            }
            AnnotationContent::Bubble(_) => false,
        })
    }

    /// Replace the style of an arrow
    pub fn set_arrow_style(&mut self, id: AnnotationId, style: ArrowStyle) -> Result<()> {
        self.update_content(id, |content| match content {
            AnnotationContent::Arrow(data) => {
                data.style = style;
                true
            }
            AnnotationContent::Bubble(_) => false,
        })
    }

    fn update_content<F>(&mut self, id: AnnotationId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut AnnotationContent) -> bool,
    {
        let item = self.items.get_mut(&id).ok_or(TimelineError::NotFound(id))?;
        if edit(&mut item.content) {
            Ok(())
        } else {
            Err(TimelineError::KindMismatch)
        }
    }

    /// Get an annotation
    pub fn get(&self, id: AnnotationId) -> Option<&AnnotationItem> {
        self.items.get(&id)
    }

    /// Whether an annotation exists
    pub fn contains(&self, id: AnnotationId) -> bool {
        self.items.contains_key(&id)
    }

    /// Annotations in start-time order
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationItem> {
        self.items.values()
    }

    /// Number of annotations
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no annotations
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Annotations overlapping the open range `(start, end)`
    pub fn in_range(&self, start: f64, end: f64) -> Vec<&AnnotationItem> {
        self.items
            .values()
            .filter(|item| item.annotation.overlaps(start, end))
            .collect()
    }

    /// Annotations shown at `time`, bottom to top
    pub fn visible_at(&self, time: f64) -> Vec<&AnnotationItem> {
        let mut visible: Vec<_> = self
            .items
            .values()
            .filter(|item| item.annotation.is_visible_at(time))
            .collect();
        visible.sort_by_key(|item| item.annotation.z_index);
        visible
    }

    /// All annotations, bottom to top
    pub fn by_z_order(&self) -> Vec<&AnnotationItem> {
        let mut ordered: Vec<_> = self.items.values().collect();
        ordered.sort_by_key(|item| item.annotation.z_index);
        ordered
    }

    /// Latest end time of any annotation
    pub fn content_duration(&self) -> f64 {
        self.items
            .values()
            .map(|item| item.annotation.end_time)
            .fold(0.0, f64::max)
    }

    /// Copy of the list in start-time order
    pub fn to_vec(&self) -> Vec<AnnotationItem> {
        self.items.values().cloned().collect()
    }

    fn next_z_index(&self) -> i32 {
        self.items
            .values()
            .map(|item| item.annotation.z_index + 1)
            .max()
            .unwrap_or(0)
    }

    fn sort(&mut self) {
        self.items.sort_by(|_, a, _, b| {
            a.annotation
                .start_time
                .partial_cmp(&b.annotation.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

impl From<Vec<AnnotationItem>> for AnnotationTimeline {
    fn from(items: Vec<AnnotationItem>) -> Self {
        let mut timeline = Self {
            items: items
                .into_iter()
                .map(|mut item| {
                    item.annotation.clamp_duration();
                    (item.id(), item)
                })
                .collect(),
        };
        timeline.sort();
        timeline
    }
}

impl From<AnnotationTimeline> for Vec<AnnotationItem> {
    fn from(timeline: AnnotationTimeline) -> Self {
        timeline.items.into_values().collect()
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Playhead and transport for the preview
#[derive(Debug, Clone)]
pub struct PlaybackController {
    /// Current playhead time in seconds
    pub time: f64,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f64,
}

impl PlaybackController {
    /// Create a new playback controller
    pub fn new() -> Self {
        Self {
            time: 0.0,
            state: PlaybackState::Stopped,
            speed: 1.0,
        }
    }

    /// Advance by `delta_time` seconds, stopping at `duration`
    pub fn update(&mut self, delta_time: f64, duration: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.time += delta_time * self.speed;
        if self.time >= duration {
            self.time = duration.max(0.0);
            self.state = PlaybackState::Stopped;
        }
    }

    /// Play from current position
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Seek to a time, clamped to `[0, duration]`
    pub fn seek(&mut self, time: f64, duration: f64) {
        self.time = time.clamp(0.0, duration.max(0.0));
    }

    /// Pause and move one frame forward
    pub fn step_forward(&mut self, clock: &FrameClock, duration: f64) {
        self.pause();
        self.seek(clock.nudge_forward(self.time), duration);
    }

    /// Pause and move one frame back
    pub fn step_backward(&mut self, clock: &FrameClock, duration: f64) {
        self.pause();
        self.seek(clock.nudge_backward(self.time), duration);
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current frame number
    pub fn current_frame(&self, clock: &FrameClock) -> i64 {
        clock.frame_index(self.time)
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::MIN_DURATION;

    fn starts(timeline: &AnnotationTimeline) -> Vec<f64> {
        timeline.iter().map(|item| item.annotation.start_time).collect()
    }

    #[test]
    fn test_add_sorts_by_start_and_stacks_on_top() {
        let mut timeline = AnnotationTimeline::new();
        let a = timeline.add(AnnotationItem::bubble(5.0, 8.0));
        let b = timeline.add(AnnotationItem::arrow(1.0, 4.0));
        let c = timeline.add(AnnotationItem::bubble(3.0, 6.0));

        assert_eq!(starts(&timeline), vec![1.0, 3.0, 5.0]);
        assert_eq!(timeline.get(a).unwrap().annotation.z_index, 0);
        assert_eq!(timeline.get(b).unwrap().annotation.z_index, 1);
        assert_eq!(timeline.get(c).unwrap().annotation.z_index, 2);
    }

    #[test]
    fn test_update_keeps_min_duration() {
        let mut timeline = AnnotationTimeline::new();
        let id = timeline.add(AnnotationItem::bubble(1.0, 4.0));

        timeline.set_time_range(id, 2.0, 1.0).unwrap();
        let annotation = &timeline.get(id).unwrap().annotation;
        assert!(annotation.end_time - annotation.start_time >= MIN_DURATION - 1e-12);

        timeline.update(id, |item| item.annotation.end_time = item.annotation.start_time).unwrap();
        let annotation = &timeline.get(id).unwrap().annotation;
        assert!(annotation.end_time - annotation.start_time >= MIN_DURATION - 1e-12);
    }

    #[test]
    fn test_update_rejects_kind_change() {
        let mut timeline = AnnotationTimeline::new();
        let id = timeline.add(AnnotationItem::bubble(0.0, 3.0));
        let arrow = AnnotationItem::arrow(0.0, 3.0);

        let result = timeline.update(id, |item| item.content = arrow.content.clone());
        assert_eq!(result, Err(TimelineError::KindMismatch));
        assert!(timeline.get(id).unwrap().content.as_bubble().is_some());

        assert_eq!(
            timeline.set_arrow_geometry(id, ArrowGeometry::default()),
            Err(TimelineError::KindMismatch)
        );
    }

    #[test]
    fn test_update_missing() {
        let mut timeline = AnnotationTimeline::new();
        let id = AnnotationId::new();
        assert_eq!(timeline.set_bubble_text(id, "x"), Err(TimelineError::NotFound(id)));
    }

    #[test]
    fn test_retiming_resorts() {
        let mut timeline = AnnotationTimeline::new();
        let first = timeline.add(AnnotationItem::bubble(1.0, 2.0));
        timeline.add(AnnotationItem::bubble(3.0, 4.0));
        timeline.set_time_range(first, 6.0, 7.0).unwrap();
        assert_eq!(starts(&timeline), vec![3.0, 6.0]);
    }

    #[test]
    fn test_queries() {
        let mut timeline = AnnotationTimeline::new();
        let a = timeline.add(AnnotationItem::bubble(0.0, 2.0));
        let b = timeline.add(AnnotationItem::arrow(1.0, 3.0));
        timeline.add(AnnotationItem::bubble(5.0, 6.0));

        assert_eq!(timeline.in_range(1.5, 4.0).len(), 2);
        assert_eq!(timeline.in_range(2.0, 2.5).len(), 1);

        let visible: Vec<_> = timeline.visible_at(1.5).iter().map(|item| item.id()).collect();
        assert_eq!(visible, vec![a, b]);
        assert!(timeline.visible_at(4.0).is_empty());
        assert_eq!(timeline.content_duration(), 6.0);
    }

    #[test]
    fn test_visible_at_orders_by_z_index() {
        let items = vec![
            AnnotationItem::bubble(0.0, 5.0).with_z_index(2),
            AnnotationItem::bubble(0.5, 5.0).with_z_index(0),
            AnnotationItem::arrow(1.0, 5.0).with_z_index(1),
        ];
        let timeline = AnnotationTimeline::from(items);
        let z: Vec<i32> = timeline.visible_at(2.0).iter().map(|item| item.annotation.z_index).collect();
        assert_eq!(z, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove() {
        let mut timeline = AnnotationTimeline::new();
        let id = timeline.add(AnnotationItem::bubble(0.0, 3.0));
        assert!(timeline.remove(id).is_some());
        assert!(timeline.remove(id).is_none());
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let mut timeline = AnnotationTimeline::new();
        timeline.add(AnnotationItem::bubble(0.0, 3.0));
        timeline.add(AnnotationItem::arrow(1.0, 3.0));
        let value = serde_json::to_value(&timeline).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        let restored: AnnotationTimeline = serde_json::from_value(value).unwrap();
        assert_eq!(restored, timeline);
    }

    #[test]
    fn test_playback() {
        let clock = FrameClock::from_frame_rate(10.0);
        let mut playback = PlaybackController::new();
        playback.play();
        playback.update(0.22, 1.0);
        assert!((playback.time - 0.22).abs() < 1e-12);

        playback.step_forward(&clock, 1.0);
        assert_eq!(playback.state, PlaybackState::Paused);
        assert!((playback.time - 0.3).abs() < 1e-12);
        assert_eq!(playback.current_frame(&clock), 3);

        playback.play();
        playback.update(5.0, 1.0);
        assert_eq!(playback.time, 1.0);
        assert!(!playback.is_playing());

        playback.seek(-2.0, 1.0);
        assert_eq!(playback.time, 0.0);
        playback.step_backward(&clock, 1.0);
        assert_eq!(playback.time, 0.0);
    }
}
