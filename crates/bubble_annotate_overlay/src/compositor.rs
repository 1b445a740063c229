// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export compositor.
//!
//! This module handles:
//! - Validating the source asset and sizing the composition
//! - Assembling the overlay layer tree for every annotation
//! - Driving the render primitive with periodic progress sampling
//! - Cancellation and cleanup of partial output
//!
//! States run `Idle -> Preparing -> Rendering -> {Completed | Cancelled | Failed}`.

use crate::error::{ExportError, RenderError};
use crate::layer::OverlayTree;
use crate::layout::Size;
use crate::raster::TextRasterizer;
use crate::tree::build_overlay_tree;
use bubble_annotate_sequencer::{AnnotationItem, ExportPreset, FrameClock, MediaAsset};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Default progress sampling interval
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Compositor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorConfig {
    /// How often render progress is sampled while rendering
    pub progress_interval: Duration,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Lifecycle phase of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    /// No export has run yet
    #[default]
    Idle,
    /// Validating the source and assembling layers
    Preparing,
    /// The render primitive is running
    Rendering,
    /// Output file written
    Completed,
    /// Stopped by the user
    Cancelled,
    /// Stopped by an error
    Failed,
}

impl ExportPhase {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Preparing => "Preparing",
            Self::Rendering => "Rendering",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Whether the export has finished one way or another
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Read-only progress snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportProgress {
    /// Current phase
    pub phase: ExportPhase,
    /// Render progress (0.0 - 1.0)
    pub progress: f32,
    /// Whether the export completed successfully
    pub is_complete: bool,
    /// Error message if the export failed
    pub error: Option<String>,
}

/// Shared export state.
///
/// Written by the export task and the cancel caller, read by progress
/// observers. The published fields share one lock so a snapshot never mixes
/// two updates.
struct ExportState {
    cancelled: AtomicBool,
    status: Mutex<ExportProgress>,
    control: Mutex<Option<Arc<dyn RenderControl>>>,
    updates: watch::Sender<ExportProgress>,
}

impl ExportState {
    fn new() -> Self {
        let (updates, _) = watch::channel(ExportProgress::default());
        Self {
            cancelled: AtomicBool::new(false),
            status: Mutex::new(ExportProgress::default()),
            control: Mutex::new(None),
            updates,
        }
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        *self.control.lock() = None;
        self.update(|status| {
            *status = ExportProgress {
                phase: ExportPhase::Preparing,
                ..ExportProgress::default()
            };
        });
    }

    /// Apply `change` and publish the result while still holding the lock
    fn update(&self, change: impl FnOnce(&mut ExportProgress)) {
        let mut status = self.status.lock();
        change(&mut *status);
        self.updates.send_replace(status.clone());
    }

    fn phase(&self) -> ExportPhase {
        self.status.lock().phase
    }

    fn set_phase(&self, phase: ExportPhase) {
        self.update(|status| status.phase = phase);
    }

    fn set_progress(&self, progress: f32) {
        let progress = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
        self.update(|status| {
            if !status.phase.is_terminal() {
                status.progress = progress;
            }
        });
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn mark_complete(&self) {
        self.update(|status| {
            status.phase = ExportPhase::Completed;
            status.progress = 1.0;
            status.is_complete = true;
        });
    }

    /// Enter `Cancelled` or `Failed`, dropping the stale progress
    fn mark_stopped(&self, phase: ExportPhase, error: Option<String>) {
        self.update(|status| {
            status.phase = phase;
            status.progress = 0.0;
            status.is_complete = false;
            status.error = error;
        });
    }

    fn snapshot(&self) -> ExportProgress {
        self.status.lock().clone()
    }
}

/// Everything the render primitive needs for one export
#[derive(Debug)]
pub struct RenderJob {
    /// Source asset
    pub source: Arc<dyn MediaAsset>,
    /// Trimmed source range in seconds
    pub time_range: Range<f64>,
    /// Whether the source audio is muxed into the output
    pub include_audio: bool,
    /// Output frame size
    pub render_size: Size,
    /// Seconds per output frame
    pub frame_duration: f64,
    /// Video layer plus annotation layers
    pub overlay: OverlayTree,
    /// Where the output is written
    pub output_path: PathBuf,
    /// Export preset
    pub preset: ExportPreset,
}

/// Live handle on a running render
pub trait RenderControl: Send + Sync {
    /// Fraction rendered so far (0.0 - 1.0)
    fn progress(&self) -> f32;

    /// Ask the render to stop; must be safe to call repeatedly
    fn cancel(&self);
}

/// A started render
pub struct RenderHandle {
    /// Resolves when the render stops
    pub completion: BoxFuture<'static, Result<(), RenderError>>,
    /// Progress and cancellation
    pub control: Arc<dyn RenderControl>,
}

/// External render-and-mux primitive
pub trait RenderPrimitive: Send + Sync {
    /// Start rendering `job` in the background
    fn start(&self, job: RenderJob) -> Result<RenderHandle, RenderError>;
}

/// One export invocation
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source asset
    pub source: Arc<dyn MediaAsset>,
    /// Annotations to burn in
    pub annotations: Vec<AnnotationItem>,
    /// Output file
    pub output_path: PathBuf,
    /// Export preset
    pub preset: ExportPreset,
}

/// Default output file in `dir`: `BubbleAnnotate_<preset>_<unix seconds>.mp4`
pub fn default_output_path(dir: &Path, preset: &ExportPreset) -> PathBuf {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    dir.join(format!("BubbleAnnotate_{}_{}.mp4", preset.file_stem(), seconds))
}

/// Drives exports through a render primitive.
///
/// One export runs at a time; starting a new one resets the progress state.
pub struct ExportCompositor {
    renderer: Arc<dyn RenderPrimitive>,
    config: CompositorConfig,
    state: Arc<ExportState>,
    rasterizer: Arc<Mutex<TextRasterizer>>,
}

impl ExportCompositor {
    /// Create a new compositor
    pub fn new(renderer: Arc<dyn RenderPrimitive>, config: CompositorConfig) -> Self {
        Self {
            renderer,
            config,
            state: Arc::new(ExportState::new()),
            rasterizer: Arc::new(Mutex::new(TextRasterizer::new())),
        }
    }

    /// Current progress snapshot
    pub fn progress(&self) -> ExportProgress {
        self.state.snapshot()
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> watch::Receiver<ExportProgress> {
        self.state.updates.subscribe()
    }

    /// Request cancellation of the running export.
    ///
    /// Safe to call any number of times; does nothing once the export has
    /// finished or when none has started.
    pub fn cancel(&self) {
        let phase = self.state.phase();
        if phase == ExportPhase::Idle || phase.is_terminal() {
            return;
        }
        if self.state.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("Export cancellation requested during {}", phase.name());
        if let Some(control) = self.state.control.lock().clone() {
            control.cancel();
        }
    }

    /// Run an export to completion.
    ///
    /// Returns the output path on success. On cancellation or render failure
    /// any partial output file is removed before returning.
    pub async fn export(&self, request: ExportRequest) -> Result<PathBuf, ExportError> {
        self.state.reset();
        tracing::info!(
            "Exporting {} annotations from {} to {}",
            request.annotations.len(),
            request.source.path().display(),
            request.output_path.display()
        );

        let result = self.run(request).await;
        match &result {
            Ok(path) => {
                self.state.mark_complete();
                tracing::info!("Export completed: {}", path.display());
            }
            Err(ExportError::Cancelled) => {
                self.state.mark_stopped(ExportPhase::Cancelled, None);
                tracing::info!("Export cancelled");
            }
            Err(e) => {
                self.state.mark_stopped(ExportPhase::Failed, Some(error_chain(e)));
                tracing::error!("Export failed: {}", error_chain(e));
            }
        }
        result
    }

    async fn run(&self, request: ExportRequest) -> Result<PathBuf, ExportError> {
        let ExportRequest {
            source,
            annotations,
            output_path,
            preset,
        } = request;

        let track = source.video_track().ok_or(ExportError::NoVideoTrack)?;
        let duration = source.duration();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ExportError::CompositionBuildFailed(format!(
                "source duration {duration} is not positive"
            )));
        }
        let render_size = Size::new(track.natural_width, track.natural_height);
        if !render_size.is_positive() {
            return Err(ExportError::CompositionBuildFailed(format!(
                "source size {}x{} is empty",
                render_size.width, render_size.height
            )));
        }
        let frame_duration = FrameClock::for_asset(Some(source.as_ref())).frame_duration();

        // Text shaping is CPU bound; keep it off the async workers
        let rasterizer = Arc::clone(&self.rasterizer);
        let overlay = tokio::task::spawn_blocking(move || {
            build_overlay_tree(
                &annotations,
                render_size,
                duration,
                track.preferred_transform,
                &mut rasterizer.lock(),
            )
        })
        .await
        .map_err(|e| ExportError::CompositionBuildFailed(format!("layer assembly stopped: {e}")))?;
        if self.state.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        tracing::debug!(
            "Assembled overlay with {} annotation layers at {}x{}",
            overlay.annotations.len(),
            render_size.width,
            render_size.height
        );

        remove_existing(&output_path)
            .await
            .map_err(|e| ExportError::CompositionBuildFailed(format!("cannot replace output: {e}")))?;

        if self.state.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let job = RenderJob {
            include_audio: source.has_audio(),
            source,
            time_range: 0.0..duration,
            render_size,
            frame_duration,
            overlay,
            output_path: output_path.clone(),
            preset,
        };

        self.state.set_phase(ExportPhase::Rendering);
        let handle = self.renderer.start(job).map_err(ExportError::RenderFailed)?;
        *self.state.control.lock() = Some(Arc::clone(&handle.control));
        // A cancel that landed before the control was registered
        if self.state.is_cancelled() {
            handle.control.cancel();
        }

        let outcome = self.await_render(handle).await;
        *self.state.control.lock() = None;

        let cancelled = self.state.is_cancelled();
        match outcome {
            Ok(()) if !cancelled => Ok(output_path),
            Ok(()) | Err(RenderError::Cancelled) => {
                cleanup(&output_path).await;
                Err(ExportError::Cancelled)
            }
            Err(_) if cancelled => {
                cleanup(&output_path).await;
                Err(ExportError::Cancelled)
            }
            Err(e) => {
                cleanup(&output_path).await;
                Err(ExportError::RenderFailed(e))
            }
        }
    }

    async fn await_render(&self, handle: RenderHandle) -> Result<(), RenderError> {
        let RenderHandle {
            mut completion,
            control,
        } = handle;
        let mut ticker = tokio::time::interval(self.config.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = &mut completion => return result,
                _ = ticker.tick() => {
                    if self.state.is_cancelled() {
                        control.cancel();
                    }
                    let progress = control.progress();
                    self.state.set_progress(progress);
                    tracing::trace!("Render progress {:.1}%", progress * 100.0);
                }
            }
        }
    }
}

impl std::fmt::Debug for ExportCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportCompositor")
            .field("config", &self.config)
            .field("progress", &self.state.snapshot())
            .finish_non_exhaustive()
    }
}

/// Remove a stale file at the output path so the render can create it
async fn remove_existing(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Best-effort removal of partial output
async fn cleanup(path: &Path) {
    if let Err(e) = remove_existing(path).await {
        tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
    }
}

fn error_chain(error: &ExportError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_sequencer::{AnnotationId, VideoTrackInfo, VideoTransform};
    use std::sync::atomic::AtomicU32;

    #[derive(Debug)]
    struct FakeAsset {
        path: PathBuf,
        duration: f64,
        track: Option<VideoTrackInfo>,
    }

    impl FakeAsset {
        fn video(duration: f64) -> Self {
            Self {
                path: PathBuf::from("clip.mov"),
                duration,
                track: Some(VideoTrackInfo {
                    natural_width: 320.0,
                    natural_height: 180.0,
                    preferred_transform: VideoTransform::IDENTITY,
                    nominal_frame_rate: 30.0,
                }),
            }
        }

        fn audio_only() -> Self {
            Self {
                path: PathBuf::from("voice.m4a"),
                duration: 5.0,
                track: None,
            }
        }
    }

    impl MediaAsset for FakeAsset {
        fn path(&self) -> &Path {
            &self.path
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn video_track(&self) -> Option<VideoTrackInfo> {
            self.track
        }

        fn has_audio(&self) -> bool {
            false
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Behavior {
        Succeed,
        Fail,
        WaitForCancel,
    }

    #[derive(Default)]
    struct FakeControl {
        progress: AtomicU32,
        cancelled: AtomicBool,
    }

    impl RenderControl for FakeControl {
        fn progress(&self) -> f32 {
            f32::from_bits(self.progress.load(Ordering::Acquire))
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::Release);
        }
    }

    struct FakeRenderer {
        behavior: Behavior,
        stacking: Mutex<Option<Vec<AnnotationId>>>,
    }

    impl FakeRenderer {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                stacking: Mutex::new(None),
            })
        }
    }

    impl RenderPrimitive for FakeRenderer {
        fn start(&self, job: RenderJob) -> Result<RenderHandle, RenderError> {
            *self.stacking.lock() = Some(job.overlay.stacking_order());
            let control = Arc::new(FakeControl::default());
            let behavior = self.behavior;
            let task_control = Arc::clone(&control);
            let completion = Box::pin(fake_render(job.output_path, behavior, task_control));
            Ok(RenderHandle { completion, control })
        }
    }

    async fn fake_render(
        path: PathBuf,
        behavior: Behavior,
        control: Arc<FakeControl>,
    ) -> Result<(), RenderError> {
        tokio::fs::write(&path, b"partial").await?;
        control.progress.store(0.5f32.to_bits(), Ordering::Release);
        match behavior {
            Behavior::Succeed => {
                tokio::fs::write(&path, b"complete").await?;
                Ok(())
            }
            Behavior::Fail => Err(RenderError::Backend("encoder crashed".into())),
            Behavior::WaitForCancel => loop {
                if control.cancelled.load(Ordering::Acquire) {
                    return Err(RenderError::Cancelled);
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            },
        }
    }

    fn compositor(renderer: Arc<FakeRenderer>) -> ExportCompositor {
        ExportCompositor::new(
            renderer,
            CompositorConfig {
                progress_interval: Duration::from_millis(5),
            },
        )
    }

    fn request(source: FakeAsset, dir: &Path, annotations: Vec<AnnotationItem>) -> ExportRequest {
        ExportRequest {
            source: Arc::new(source),
            annotations,
            output_path: dir.join("out.mp4"),
            preset: ExportPreset::original(),
        }
    }

    #[tokio::test]
    async fn test_no_video_track_fails_before_any_file() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(FakeRenderer::new(Behavior::Succeed));
        let result = compositor
            .export(request(FakeAsset::audio_only(), dir.path(), Vec::new()))
            .await;
        assert!(matches!(result, Err(ExportError::NoVideoTrack)));
        assert!(!dir.path().join("out.mp4").exists());
        let progress = compositor.progress();
        assert_eq!(progress.phase, ExportPhase::Failed);
        assert!(!progress.is_complete);
        assert!(progress.error.is_some());
    }

    #[tokio::test]
    async fn test_successful_export_completes_at_full_progress() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(FakeRenderer::new(Behavior::Succeed));
        let mut updates = compositor.subscribe();
        let path = compositor
            .export(request(
                FakeAsset::video(4.0),
                dir.path(),
                vec![AnnotationItem::bubble(0.0, 2.0)],
            ))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"complete");

        let progress = compositor.progress();
        assert!(progress.is_complete);
        assert_eq!(progress.progress, 1.0);
        assert_eq!(progress.phase, ExportPhase::Completed);

        let latest = updates.borrow_and_update().clone();
        assert!(latest.is_complete);
        assert_eq!(latest.progress, 1.0);
    }

    #[tokio::test]
    async fn test_cancel_mid_render_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = Arc::new(compositor(FakeRenderer::new(Behavior::WaitForCancel)));
        let task = {
            let compositor = Arc::clone(&compositor);
            let request = request(FakeAsset::video(4.0), dir.path(), Vec::new());
            tokio::spawn(async move { compositor.export(request).await })
        };

        while compositor.progress().progress < 0.5 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(dir.path().join("out.mp4").exists());
        compositor.cancel();
        compositor.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ExportError::Cancelled)));
        assert!(!dir.path().join("out.mp4").exists());
        let progress = compositor.progress();
        assert_eq!(progress.phase, ExportPhase::Cancelled);
        assert_eq!(progress.progress, 0.0);

        // No-op once terminal
        compositor.cancel();
        assert_eq!(compositor.progress().phase, ExportPhase::Cancelled);
    }

    #[tokio::test]
    async fn test_render_failure_is_wrapped_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(FakeRenderer::new(Behavior::Fail));
        let result = compositor
            .export(request(FakeAsset::video(4.0), dir.path(), Vec::new()))
            .await;
        match result {
            Err(ExportError::RenderFailed(RenderError::Backend(message))) => {
                assert_eq!(message, "encoder crashed");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!dir.path().join("out.mp4").exists());
        let progress = compositor.progress();
        assert_eq!(progress.progress, 0.0);
        assert!(progress.error.unwrap().contains("encoder crashed"));
    }

    fn assert_consistent(progress: &ExportProgress) {
        assert_eq!(progress.is_complete, progress.phase == ExportPhase::Completed);
        if progress.is_complete {
            assert_eq!(progress.progress, 1.0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_completed_snapshots_always_report_full_progress() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = Arc::new(compositor(FakeRenderer::new(Behavior::Succeed)));

        let mut updates = compositor.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while updates.changed().await.is_ok() {
                let progress = updates.borrow_and_update().clone();
                let done = progress.phase.is_terminal();
                seen.push(progress);
                if done {
                    break;
                }
            }
            seen
        });
        let reader = {
            let compositor = Arc::clone(&compositor);
            std::thread::spawn(move || loop {
                let progress = compositor.progress();
                assert_consistent(&progress);
                if progress.phase.is_terminal() {
                    break;
                }
                std::hint::spin_loop();
            })
        };

        compositor
            .export(request(FakeAsset::video(4.0), dir.path(), Vec::new()))
            .await
            .unwrap();
        reader.join().unwrap();

        let seen = watcher.await.unwrap();
        seen.iter().for_each(assert_consistent);
        assert!(seen.last().is_some_and(|progress| progress.is_complete));
    }

    #[tokio::test]
    async fn test_cancel_during_preparation_skips_render() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::new(Behavior::Succeed);
        let compositor = Arc::new(compositor(Arc::clone(&renderer)));
        // Layer assembly waits on the rasterizer until the cancel is in
        let rasterizer = compositor.rasterizer.lock();
        let task = {
            let compositor = Arc::clone(&compositor);
            let items = vec![AnnotationItem::bubble(0.0, 2.0)];
            let request = request(FakeAsset::video(4.0), dir.path(), items);
            tokio::spawn(async move { compositor.export(request).await })
        };
        while compositor.progress().phase != ExportPhase::Preparing {
            tokio::task::yield_now().await;
        }
        compositor.cancel();
        drop(rasterizer);

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ExportError::Cancelled)));
        assert!(renderer.stacking.lock().is_none());
        assert!(!dir.path().join("out.mp4").exists());
    }

    #[tokio::test]
    async fn test_export_after_failure_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(FakeRenderer::new(Behavior::Succeed));
        let _ = compositor
            .export(request(FakeAsset::audio_only(), dir.path(), Vec::new()))
            .await;
        assert_eq!(compositor.progress().phase, ExportPhase::Failed);

        compositor
            .export(request(FakeAsset::video(2.0), dir.path(), Vec::new()))
            .await
            .unwrap();
        let progress = compositor.progress();
        assert!(progress.error.is_none());
        assert!(progress.is_complete);
    }

    #[tokio::test]
    async fn test_layers_stack_by_ascending_z_index() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::new(Behavior::Succeed);
        let compositor = compositor(Arc::clone(&renderer));
        let items = vec![
            AnnotationItem::bubble(0.0, 3.0).with_z_index(2),
            AnnotationItem::arrow(0.0, 3.0).with_z_index(0),
            AnnotationItem::bubble(0.0, 3.0).with_z_index(1),
        ];
        let expected = vec![items[1].id(), items[2].id(), items[0].id()];
        compositor
            .export(request(FakeAsset::video(4.0), dir.path(), items))
            .await
            .unwrap();
        assert_eq!(renderer.stacking.lock().clone(), Some(expected));
    }

    #[tokio::test]
    async fn test_zero_duration_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let compositor = compositor(FakeRenderer::new(Behavior::Succeed));
        let result = compositor
            .export(request(FakeAsset::video(0.0), dir.path(), Vec::new()))
            .await;
        assert!(matches!(result, Err(ExportError::CompositionBuildFailed(_))));
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let compositor = compositor(FakeRenderer::new(Behavior::Succeed));
        compositor.cancel();
        assert_eq!(compositor.progress(), ExportProgress::default());
    }

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/tmp/exports"), &ExportPreset::original());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("BubbleAnnotate_Original_"));
        assert!(name.ends_with(".mp4"));
    }
}
