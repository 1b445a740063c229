// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state management.
//!
//! This module contains the editing session: the open project, the
//! selection, the playhead, the frame clock and the undo history. Every
//! annotation mutation goes through [`EditorState`] so it is recorded for undo.

use crate::history::{Edit, History, HistoryError, Snapshot};
use bubble_annotate_sequencer::{
    AnnotationId, AnnotationItem, AnnotationTimeline, ArrowGeometry, ArrowStyle, BubbleGeometry,
    BubbleStyle, FrameClock, MediaAsset, PlaybackController, Project, TimelineError,
    DEFAULT_DURATION,
};
use std::path::PathBuf;
use thiserror::Error;

/// Editing errors
#[derive(Debug, Error)]
pub enum EditorError {
    /// The annotation list rejected the change
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Undo history failed
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// An open drag gesture: the list as it was when the gesture began
#[derive(Debug)]
struct Gesture {
    description: String,
    before: Snapshot,
}

/// Editing session state
#[derive(Debug)]
pub struct EditorState {
    /// Open project
    pub project: Project,
    /// Where the project was loaded from or last saved to
    pub document_path: Option<PathBuf>,
    /// Selected annotation
    pub selection: Option<AnnotationId>,
    /// Preview transport
    pub playback: PlaybackController,
    /// Frame clock for the loaded source
    pub clock: FrameClock,
    /// Source duration in seconds
    pub duration: f64,
    history: History,
    gesture: Option<Gesture>,
    dirty: bool,
}

impl EditorState {
    /// Create a new editor state for a project
    pub fn new(project: Project) -> Self {
        Self {
            project,
            document_path: None,
            selection: None,
            playback: PlaybackController::new(),
            clock: FrameClock::new(),
            duration: 0.0,
            history: History::default(),
            gesture: None,
            dirty: false,
        }
    }

    /// Use a custom undo depth
    #[must_use]
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.history = History::with_max_depth(depth);
        self
    }

    /// Attach the source asset: recompute the frame clock and the duration
    pub fn load_asset(&mut self, asset: &dyn MediaAsset) {
        self.clock.update_from_asset(Some(asset));
        self.duration = asset.duration();
        self.playback.seek(self.playback.time, self.duration);
        tracing::info!(
            "Loaded {} ({:.2}s, {:.4}s per frame)",
            asset.path().display(),
            self.duration,
            self.clock.frame_duration()
        );
    }

    /// Annotation list
    pub fn timeline(&self) -> &AnnotationTimeline {
        &self.project.annotations
    }

    /// Selected annotation, if it still exists
    pub fn selected_item(&self) -> Option<&AnnotationItem> {
        self.selection.and_then(|id| self.project.annotations.get(id))
    }

    /// Select an annotation, or clear the selection with `None`
    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selection = id.filter(|id| self.project.annotations.contains(*id));
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the project as saved
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.document_path = Some(path);
        self.dirty = false;
    }

    /// Add a bubble at the playhead, lasting the default duration, and select it
    pub fn add_bubble_at_playhead(&mut self) -> Result<AnnotationId> {
        let start = self.clock.snap_to_frame(self.playback.time);
        self.add(AnnotationItem::bubble(start, start + DEFAULT_DURATION), "Add bubble")
    }

    /// Add an arrow at the playhead, lasting the default duration, and select it
    pub fn add_arrow_at_playhead(&mut self) -> Result<AnnotationId> {
        let start = self.clock.snap_to_frame(self.playback.time);
        self.add(AnnotationItem::arrow(start, start + DEFAULT_DURATION), "Add arrow")
    }

    /// Add an annotation and select it
    pub fn add(&mut self, item: AnnotationItem, description: &str) -> Result<AnnotationId> {
        let id = self.record(description, |timeline| Ok(timeline.add(item)))?;
        self.selection = Some(id);
        Ok(id)
    }

    /// Remove an annotation; clears the selection if it was selected
    pub fn remove(&mut self, id: AnnotationId) -> Result<AnnotationItem> {
        let removed = self.record("Delete annotation", |timeline| {
            timeline.remove(id).ok_or(TimelineError::NotFound(id))
        })?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        Ok(removed)
    }

    /// Remove the selected annotation
    pub fn delete_selected(&mut self) -> Result<Option<AnnotationItem>> {
        match self.selection {
            Some(id) => self.remove(id).map(Some),
            None => Ok(None),
        }
    }

    /// Change when an annotation is shown
    pub fn set_time_range(&mut self, id: AnnotationId, start: f64, end: f64) -> Result<()> {
        self.record("Change timing", |timeline| timeline.set_time_range(id, start, end))
    }

    /// Replace a bubble's geometry
    pub fn set_bubble_geometry(&mut self, id: AnnotationId, geometry: BubbleGeometry) -> Result<()> {
        self.record("Move bubble", |timeline| timeline.set_bubble_geometry(id, geometry))
    }

    /// Replace a bubble's style
    pub fn set_bubble_style(&mut self, id: AnnotationId, style: BubbleStyle) -> Result<()> {
        self.record("Change bubble style", |timeline| timeline.set_bubble_style(id, style))
    }

    /// Replace a bubble's text
    pub fn set_bubble_text(&mut self, id: AnnotationId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.record("Edit bubble text", |timeline| timeline.set_bubble_text(id, text))
    }

    /// Replace an arrow's geometry
    pub fn set_arrow_geometry(&mut self, id: AnnotationId, geometry: ArrowGeometry) -> Result<()> {
        self.record("Move arrow", |timeline| timeline.set_arrow_geometry(id, geometry))
    }

    /// Replace an arrow's style
    pub fn set_arrow_style(&mut self, id: AnnotationId, style: ArrowStyle) -> Result<()> {
        self.record("Change arrow style", |timeline| timeline.set_arrow_style(id, style))
    }

    /// Start a gesture; mutations until [`EditorState::end_gesture`] become one undo step
    pub fn begin_gesture(&mut self, description: &str) -> Result<()> {
        if self.gesture.is_some() {
            return Ok(());
        }
        self.gesture = Some(Gesture {
            description: description.to_string(),
            before: Snapshot::of(&self.project.annotations)?,
        });
        Ok(())
    }

    /// Finish the open gesture and record it
    pub fn end_gesture(&mut self) -> Result<()> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(());
        };
        let after = Snapshot::of(&self.project.annotations)?;
        self.history.commit(Edit::new(gesture.description, gesture.before, after));
        Ok(())
    }

    /// Whether a gesture is open
    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Undo the last edit
    pub fn undo(&mut self) -> Result<()> {
        self.end_gesture()?;
        let edit = self.history.undo()?.clone();
        self.restore(&edit.before)?;
        tracing::debug!("Undo: {}", edit.label);
        Ok(())
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Result<()> {
        self.end_gesture()?;
        let edit = self.history.redo()?.clone();
        self.restore(&edit.after)?;
        tracing::debug!("Redo: {}", edit.label);
        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.project.annotations = snapshot.decode()?;
        if let Some(id) = self.selection {
            if !self.project.annotations.contains(id) {
                self.selection = None;
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Apply a mutation, recording a before/after pair unless a gesture is open
    fn record<T>(
        &mut self,
        description: &str,
        mutate: impl FnOnce(&mut AnnotationTimeline) -> bubble_annotate_sequencer::timeline::Result<T>,
    ) -> Result<T> {
        let before = if self.gesture.is_none() {
            Some(Snapshot::of(&self.project.annotations)?)
        } else {
            None
        };
        let value = mutate(&mut self.project.annotations)?;
        self.dirty = true;
        if let Some(before) = before {
            let after = Snapshot::of(&self.project.annotations)?;
            self.history.commit(Edit::new(description, before, after));
        }
        Ok(value)
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Project::new(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_at_playhead_snaps_and_selects() {
        let mut state = EditorState::default();
        state.duration = 10.0;
        state.playback.seek(1.01, 10.0);
        let id = state.add_bubble_at_playhead().unwrap();
        assert_eq!(state.selection, Some(id));
        let item = state.timeline().get(id).unwrap();
        assert!((item.annotation.start_time - 1.0).abs() < 1e-9);
        assert!((item.annotation.end_time - 4.0).abs() < 1e-9);
        assert!(state.is_dirty());
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut state = EditorState::default();
        let id = state.add_arrow_at_playhead().unwrap();
        state.remove(id).unwrap();
        assert!(state.selection.is_none());
        assert!(matches!(
            state.remove(id),
            Err(EditorError::Timeline(TimelineError::NotFound(_)))
        ));
    }

    #[test]
    fn test_undo_redo_restores_lists() {
        let mut state = EditorState::default();
        let id = state.add_bubble_at_playhead().unwrap();
        state.set_bubble_text(id, "Changed").unwrap();

        state.undo().unwrap();
        let text = &state.timeline().get(id).unwrap().content.as_bubble().unwrap().text;
        assert_eq!(text, "New bubble");

        state.undo().unwrap();
        assert!(state.timeline().is_empty());
        assert!(state.selection.is_none());

        state.redo().unwrap();
        state.redo().unwrap();
        let text = &state.timeline().get(id).unwrap().content.as_bubble().unwrap().text;
        assert_eq!(text, "Changed");
        assert!(!state.can_redo());
    }

    #[test]
    fn test_gesture_records_one_step() {
        let mut state = EditorState::default();
        let id = state.add_bubble_at_playhead().unwrap();
        state.begin_gesture("Drag bubble").unwrap();
        for step in 1..=5 {
            let geometry = BubbleGeometry::new(0.1 * f64::from(step) / 5.0, 0.2, 0.22, 0.12);
            state.set_bubble_geometry(id, geometry).unwrap();
        }
        state.end_gesture().unwrap();

        state.undo().unwrap();
        let geometry = state.timeline().get(id).unwrap().content.as_bubble().unwrap().geometry;
        assert_eq!(geometry, BubbleGeometry::default());
        assert!(state.can_undo());
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut state = EditorState::default();
        let id = state.add_arrow_at_playhead().unwrap();
        assert!(matches!(
            state.set_bubble_text(id, "nope"),
            Err(EditorError::Timeline(TimelineError::KindMismatch))
        ));
    }

    #[test]
    fn test_short_ranges_are_extended() {
        let mut state = EditorState::default();
        let id = state.add_bubble_at_playhead().unwrap();
        state.set_time_range(id, 2.0, 2.05).unwrap();
        let annotation = &state.timeline().get(id).unwrap().annotation;
        assert!(annotation.end_time - annotation.start_time >= 0.2 - 1e-12);
    }
}
