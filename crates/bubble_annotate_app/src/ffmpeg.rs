// SPDX-License-Identifier: MIT OR Apache-2.0
//! ffmpeg backed media subsystem.
//!
//! This module handles:
//! - Probing source videos with ffprobe
//! - Baking annotation layers into full-frame PNGs
//! - Translating opacity curves into `fade` filters
//! - Running the ffmpeg encode with live progress and cancellation

use bubble_annotate_overlay::{
    render_layer, LayerContents, OverlayTree, RenderControl, RenderError, RenderHandle, RenderJob,
    RenderPrimitive,
};
use bubble_annotate_sequencer::{MediaAsset, OpacityCurve, VideoTrackInfo, VideoTransform};
use futures::FutureExt;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Notify;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 6;

/// Shortest fade handed to ffmpeg, in seconds
const MIN_FADE_DURATION: f64 = 0.001;

/// Probe errors
#[derive(Debug, Error)]
pub enum ProbeError {
    /// ffprobe could not be run
    #[error("Failed to run ffprobe: {0}")]
    Io(#[from] std::io::Error),

    /// ffprobe output was not the expected JSON
    #[error("Unexpected ffprobe output: {0}")]
    Json(#[from] serde_json::Error),

    /// ffprobe rejected the file
    #[error("ffprobe failed: {0}")]
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

impl ProbeStream {
    fn is(&self, kind: &str) -> bool {
        self.codec_type.as_deref() == Some(kind)
    }

    /// Clockwise rotation in degrees a player applies
    fn rotation_degrees(&self) -> f64 {
        if let Some(rotate) = self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()) {
            return rotate;
        }
        // Display matrix rotation is counter-clockwise
        self.side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .map_or(0.0, |rotation| -rotation)
    }

    fn frame_rate(&self) -> f64 {
        [self.avg_frame_rate.as_deref(), self.r_frame_rate.as_deref()]
            .into_iter()
            .flatten()
            .map(parse_rational)
            .find(|rate| *rate > 0.0)
            .unwrap_or(0.0)
    }
}

/// Parse an ffprobe rational such as `30000/1001`; unusable values give 0
pub fn parse_rational(value: &str) -> f64 {
    let parsed = match value.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(num), Ok(den)) if den != 0.0 => num / den,
            _ => 0.0,
        },
        None => value.trim().parse().unwrap_or(0.0),
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// A video file described by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegAsset {
    path: PathBuf,
    duration: f64,
    video: Option<VideoTrackInfo>,
    has_audio: bool,
}

impl FfmpegAsset {
    /// Probe a file with ffprobe
    pub async fn probe(ffprobe: &Path, path: &Path) -> Result<Self, ProbeError> {
        let output = Command::new(ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(ProbeError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let asset = Self::from_probe_json(path, &String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(
            "Probed {}: {:.2}s, video {}, audio {}",
            path.display(),
            asset.duration,
            asset.video.is_some(),
            asset.has_audio
        );
        Ok(asset)
    }

    /// Build an asset from ffprobe's JSON output
    pub fn from_probe_json(path: &Path, json: &str) -> Result<Self, ProbeError> {
        let probe: ProbeOutput = serde_json::from_str(json)?;
        let video_stream = probe.streams.iter().find(|stream| stream.is("video"));

        let video = video_stream.and_then(|stream| {
            let (width, height) = (f64::from(stream.width?), f64::from(stream.height?));
            let turns = (stream.rotation_degrees() / 90.0).round() as i32;
            Some(VideoTrackInfo {
                natural_width: width,
                natural_height: height,
                preferred_transform: VideoTransform::quarter_turns(turns, width, height),
                nominal_frame_rate: stream.frame_rate(),
            })
        });

        let duration = probe
            .format
            .and_then(|format| format.duration)
            .or_else(|| video_stream.and_then(|stream| stream.duration.clone()))
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        Ok(Self {
            path: path.to_path_buf(),
            duration,
            video,
            has_audio: probe.streams.iter().any(|stream| stream.is("audio")),
        })
    }
}

impl MediaAsset for FfmpegAsset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn video_track(&self) -> Option<VideoTrackInfo> {
        self.video
    }

    fn has_audio(&self) -> bool {
        self.has_audio
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegSettings {
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// x264 constant rate factor
    pub video_crf: u8,
    /// x264 speed preset
    pub video_preset: String,
}

/// `fade` filters reproducing an opacity curve on an alpha channel.
///
/// Only 0 to 1 and 1 to 0 steps become fades; flat segments need none.
pub fn fade_filters(curve: &OpacityCurve) -> Vec<String> {
    let keyframes: Vec<_> = curve.absolute_keyframes().collect();
    keyframes
        .windows(2)
        .filter_map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            let kind = if from.value < 0.5 && to.value >= 0.5 {
                "in"
            } else if from.value >= 0.5 && to.value < 0.5 {
                "out"
            } else {
                return None;
            };
            let span = (to.time - from.time).max(MIN_FADE_DURATION);
            Some(format!("fade=t={kind}:st={:.3}:d={:.3}:alpha=1", from.time, span))
        })
        .collect()
}

/// Filters that turn decoded frames upright
pub fn orientation_filters(transform: &VideoTransform) -> &'static [&'static str] {
    match transform.rotation_quarter_turns() {
        1 => &["transpose=clock"],
        2 => &["hflip", "vflip"],
        3 => &["transpose=cclock"],
        _ => &[],
    }
}

/// Output frame size, rounded down to even dimensions for 4:2:0 encoding
pub fn even_frame_size(tree: &OverlayTree) -> (u32, u32) {
    let even = |value: f64| ((value.max(2.0) as u32) / 2) * 2;
    (even(tree.size.width), even(tree.size.height))
}

/// Build the `-filter_complex` graph.
///
/// Input 0 is the source video; input `i + 1` is the baked PNG of the
/// `i`th annotation layer. The result is labelled `[out]`.
pub fn filter_graph(tree: &OverlayTree) -> String {
    let (width, height) = even_frame_size(tree);
    let transform = match &tree.video.contents {
        LayerContents::Video { transform } => *transform,
        _ => VideoTransform::IDENTITY,
    };

    let mut video_chain: Vec<String> = orientation_filters(&transform)
        .iter()
        .map(|filter| (*filter).to_string())
        .collect();
    video_chain.push(format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease"
    ));
    video_chain.push(format!("pad={width}:{height}:(ow-iw)/2:(oh-ih)/2"));
    video_chain.push("format=yuv420p".to_string());

    let mut chains = Vec::with_capacity(tree.annotations.len() * 2 + 1);
    let mut base = "base".to_string();
    chains.push(format!("[0:v]{}[{base}]", video_chain.join(",")));

    for (index, layer) in tree.annotations.iter().enumerate() {
        let mut filters = vec!["format=rgba".to_string()];
        if let Some(curve) = &layer.opacity {
            filters.extend(fade_filters(curve));
        }
        chains.push(format!("[{}:v]{}[a{index}]", index + 1, filters.join(",")));

        let next = format!("v{index}");
        chains.push(format!("[{base}][a{index}]overlay=0:0:shortest=1[{next}]"));
        base = next;
    }
    chains.push(format!("[{base}]null[out]"));
    chains.join(";")
}

/// Full ffmpeg argument list for a job whose layers were baked to `layer_paths`
pub fn ffmpeg_args(job: &RenderJob, layer_paths: &[PathBuf], settings: &FfmpegSettings) -> Vec<OsString> {
    let start = job.time_range.start;
    let length = (job.time_range.end - job.time_range.start).max(0.0);
    let frame_rate = if job.frame_duration > 0.0 {
        1.0 / job.frame_duration
    } else {
        bubble_annotate_sequencer::DEFAULT_FRAME_RATE
    };

    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-noautorotate"]
        .into_iter()
        .map(OsString::from)
        .collect();
    let mut push = |values: &[&str]| args.extend(values.iter().map(OsString::from));

    push(&["-ss", &format!("{start:.3}"), "-t", &format!("{length:.3}"), "-i"]);
    args.push(job.source.path().as_os_str().to_os_string());

    for path in layer_paths {
        args.extend(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                format!("{frame_rate:.3}"),
                "-t".to_string(),
                format!("{length:.3}"),
                "-i".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(path.as_os_str().to_os_string());
    }

    let mut push = |values: &[&str]| args.extend(values.iter().map(OsString::from));
    push(&["-filter_complex", &filter_graph(&job.overlay), "-map", "[out]"]);
    if job.include_audio {
        push(&["-map", "0:a?", "-c:a", "aac", "-b:a", "192k"]);
    } else {
        push(&["-an"]);
    }
    push(&[
        "-c:v",
        "libx264",
        "-crf",
        &settings.video_crf.to_string(),
        "-preset",
        &settings.video_preset,
        "-pix_fmt",
        "yuv420p",
    ]);
    if let Some(mbps) = job.preset.max_bitrate_mbps.filter(|mbps| *mbps > 0.0) {
        let kbps = (mbps * 1000.0).round() as u64;
        push(&["-maxrate", &format!("{kbps}k"), "-bufsize", &format!("{}k", kbps * 2)]);
    }
    if job.preset.is_web_optimized {
        push(&["-movflags", "+faststart"]);
    }
    push(&["-t", &format!("{length:.3}"), "-progress", "pipe:1", "-nostats"]);
    args.push(job.output_path.as_os_str().to_os_string());
    args
}

/// Fraction done from one `-progress` line, if it carries the output time
pub fn parse_progress_line(line: &str, total_seconds: f64) -> Option<f32> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // `out_time_ms` is also in microseconds
        "out_time_us" | "out_time_ms" => {
            let micros: f64 = value.trim().parse().ok()?;
            if total_seconds <= 0.0 {
                return Some(0.0);
            }
            Some((micros / 1_000_000.0 / total_seconds).clamp(0.0, 1.0) as f32)
        }
        "progress" if value.trim() == "end" => Some(1.0),
        _ => None,
    }
}

/// Progress and cancellation of one ffmpeg process
#[derive(Debug, Default)]
struct FfmpegControl {
    progress: AtomicU32,
    cancelled: AtomicBool,
    cancel_requested: Notify,
}

impl FfmpegControl {
    fn set_progress(&self, progress: f32) {
        self.progress.store(progress.to_bits(), Ordering::Release);
    }
}

impl RenderControl for FfmpegControl {
    fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.cancel_requested.notify_one();
        }
    }
}

/// Render primitive running ffmpeg as a child process
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    settings: FfmpegSettings,
}

impl FfmpegRenderer {
    /// Create a new renderer
    pub fn new(settings: FfmpegSettings) -> Self {
        Self { settings }
    }

    /// Paint every annotation layer into a PNG inside `dir`
    fn bake_layers(tree: &OverlayTree, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        tree.annotations
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let image =
                    render_layer(layer, tree.size).map_err(|e| RenderError::Backend(e.to_string()))?;
                let png = image
                    .encode_png()
                    .map_err(|e| RenderError::Backend(e.to_string()))?;
                let path = dir.join(format!("layer_{index:03}.png"));
                std::fs::write(&path, png)?;
                tracing::trace!("Baked {} to {}", layer.name, path.display());
                Ok(path)
            })
            .collect()
    }
}

impl RenderPrimitive for FfmpegRenderer {
    fn start(&self, job: RenderJob) -> Result<RenderHandle, RenderError> {
        let control = Arc::new(FfmpegControl::default());
        let completion = run_ffmpeg(self.settings.clone(), job, Arc::clone(&control)).boxed();
        Ok(RenderHandle { completion, control })
    }
}

/// Bake the layers, then drive ffmpeg to exit; the layer PNGs live until it does
async fn run_ffmpeg(
    settings: FfmpegSettings,
    job: RenderJob,
    control: Arc<FfmpegControl>,
) -> Result<(), RenderError> {
    // Painting and PNG encoding are CPU bound
    let (job, layers_dir, layer_paths) = tokio::task::spawn_blocking(move || {
        let layers_dir = tempfile::tempdir()?;
        let layer_paths = FfmpegRenderer::bake_layers(&job.overlay, layers_dir.path())?;
        Ok::<_, RenderError>((job, layers_dir, layer_paths))
    })
    .await
    .map_err(|e| RenderError::Backend(format!("layer baking stopped: {e}")))??;
    if control.cancelled.load(Ordering::Acquire) {
        return Err(RenderError::Cancelled);
    }

    let args = ffmpeg_args(&job, &layer_paths, &settings);
    let total = (job.time_range.end - job.time_range.start).max(0.0);
    tracing::debug!(
        "Starting {} with {} overlay inputs",
        settings.ffmpeg_path.display(),
        layer_paths.len()
    );
    let mut child = Command::new(&settings.ffmpeg_path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, (), stderr_tail) = tokio::join!(
        wait_or_cancel(&mut child, &control),
        read_progress(stdout, &control, total),
        read_tail(stderr),
    );
    drop(layers_dir);

    match status? {
        None => Err(RenderError::Cancelled),
        Some(status) if status.success() => {
            control.set_progress(1.0);
            Ok(())
        }
        Some(status) => Err(RenderError::Backend(format!("ffmpeg {status}: {stderr_tail}"))),
    }
}

/// Wait for the child; `None` when it was killed by a cancel request
async fn wait_or_cancel(child: &mut Child, control: &FfmpegControl) -> std::io::Result<Option<ExitStatus>> {
    tokio::select! {
        status = child.wait() => return status.map(Some),
        () = control.cancel_requested.notified() => {}
    }
    tracing::debug!("Killing ffmpeg");
    child.kill().await?;
    Ok(None)
}

async fn read_progress(stdout: Option<impl AsyncRead + Unpin>, control: &FfmpegControl, total: f64) {
    let Some(stdout) = stdout else {
        return;
    };
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(progress) = parse_progress_line(&line, total) {
            control.set_progress(progress);
        }
    }
}

async fn read_tail(stderr: Option<impl AsyncRead + Unpin>) -> String {
    let Some(mut stderr) = stderr else {
        return String::new();
    };
    let mut output = String::new();
    if stderr.read_to_string(&mut output).await.is_err() {
        return output;
    }
    let lines: Vec<&str> = output.lines().collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_annotate_overlay::{build_overlay_tree, Size, TextRasterizer};
    use bubble_annotate_sequencer::{AnnotationItem, ExportPreset};

    const PROBE_JSON: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "0/0",
                "duration": "9.9",
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
            },
            { "index": 1, "codec_type": "audio", "sample_rate": "48000" }
        ],
        "format": { "duration": "10.010000" }
    }"#;

    #[test]
    fn test_probe_json() {
        let asset = FfmpegAsset::from_probe_json(Path::new("/videos/demo.mov"), PROBE_JSON).unwrap();
        assert!((asset.duration() - 10.01).abs() < 1e-9);
        assert!(asset.has_audio());
        let track = asset.video_track().unwrap();
        assert_eq!(track.natural_width, 1920.0);
        assert!((track.nominal_frame_rate - 29.97).abs() < 0.01);
        assert_eq!(track.preferred_transform.rotation_quarter_turns(), 1);
    }

    #[test]
    fn test_probe_without_video() {
        let json = r#"{ "streams": [{ "codec_type": "audio" }], "format": {} }"#;
        let asset = FfmpegAsset::from_probe_json(Path::new("a.m4a"), json).unwrap();
        assert!(asset.video_track().is_none());
        assert_eq!(asset.duration(), 0.0);
        assert!(FfmpegAsset::from_probe_json(Path::new("x"), "nope").is_err());
    }

    #[test]
    fn test_parse_rational() {
        assert_eq!(parse_rational("25/1"), 25.0);
        assert_eq!(parse_rational("0/0"), 0.0);
        assert_eq!(parse_rational("24"), 24.0);
        assert_eq!(parse_rational("garbage"), 0.0);
    }

    #[test]
    fn test_fade_filters_follow_curve() {
        let late = fade_filters(&OpacityCurve::schedule(2.0, 4.0, 10.0));
        assert_eq!(late.len(), 2);
        assert!(late[0].starts_with("fade=t=in:st=1.990"));
        assert!(late[1].starts_with("fade=t=out:st=4.000:d=0.050"));

        let immediate = fade_filters(&OpacityCurve::schedule(0.0, 3.0, 10.0));
        assert_eq!(immediate.len(), 1);
        assert!(immediate[0].starts_with("fade=t=out"));
    }

    #[test]
    fn test_progress_lines() {
        assert_eq!(parse_progress_line("out_time_us=5000000", 10.0), Some(0.5));
        assert_eq!(parse_progress_line("out_time_ms=20000000", 10.0), Some(1.0));
        assert_eq!(parse_progress_line("progress=end", 10.0), Some(1.0));
        assert_eq!(parse_progress_line("progress=continue", 10.0), None);
        assert_eq!(parse_progress_line("fps=29.97", 10.0), None);
        assert_eq!(parse_progress_line("out_time_us=N/A", 10.0), None);
    }

    #[test]
    fn test_orientation_filters() {
        assert!(orientation_filters(&VideoTransform::IDENTITY).is_empty());
        assert_eq!(
            orientation_filters(&VideoTransform::quarter_turns(1, 1920.0, 1080.0)),
            &["transpose=clock"]
        );
        assert_eq!(
            orientation_filters(&VideoTransform::quarter_turns(3, 1920.0, 1080.0)),
            &["transpose=cclock"]
        );
    }

    #[test]
    fn test_filter_graph_overlays_in_order() {
        let items = vec![AnnotationItem::bubble(1.0, 3.0), AnnotationItem::arrow(0.0, 2.0)];
        let mut rasterizer = TextRasterizer::new();
        let tree = build_overlay_tree(
            &items,
            Size::new(641.0, 360.0),
            5.0,
            VideoTransform::IDENTITY,
            &mut rasterizer,
        );
        let graph = filter_graph(&tree);
        assert!(graph.starts_with("[0:v]scale=640:360"));
        assert!(graph.contains("[1:v]format=rgba,fade=t=in"));
        assert!(graph.contains("[base][a0]overlay=0:0:shortest=1[v0]"));
        assert!(graph.contains("[v0][a1]overlay=0:0:shortest=1[v1]"));
        assert!(graph.ends_with("[v1]null[out]"));
    }

    #[derive(Debug)]
    struct Source;

    impl MediaAsset for Source {
        fn path(&self) -> &Path {
            Path::new("/videos/in.mov")
        }
        fn duration(&self) -> f64 {
            4.0
        }
        fn video_track(&self) -> Option<VideoTrackInfo> {
            None
        }
        fn has_audio(&self) -> bool {
            true
        }
    }

    fn bubble_job(output_path: PathBuf) -> RenderJob {
        let mut rasterizer = TextRasterizer::new();
        let size = Size::new(320.0, 240.0);
        RenderJob {
            source: Arc::new(Source),
            time_range: 0.0..4.0,
            include_audio: true,
            render_size: size,
            frame_duration: 1.0 / 25.0,
            overlay: build_overlay_tree(
                &[AnnotationItem::bubble(0.0, 2.0)],
                size,
                4.0,
                VideoTransform::IDENTITY,
                &mut rasterizer,
            ),
            output_path,
            preset: ExportPreset::original(),
        }
    }

    #[test]
    fn test_ffmpeg_args() {
        let job = bubble_job(PathBuf::from("/tmp/out.mp4"));
        let settings = FfmpegSettings {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            video_crf: 20,
            video_preset: "fast".to_string(),
        };
        let args: Vec<String> = ffmpeg_args(&job, &[PathBuf::from("/tmp/layer_000.png")], &settings)
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let position = |value: &str| args.iter().position(|arg| arg == value).unwrap();
        assert_eq!(args[position("-crf") + 1], "20");
        assert_eq!(args[position("-preset") + 1], "fast");
        assert_eq!(args[position("-framerate") + 1], "25.000");
        assert_eq!(args[position("-c:a") + 1], "aac");
        assert_eq!(args[position("-maxrate") + 1], "12000k");
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"/tmp/layer_000.png".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn test_control_cancel_is_idempotent() {
        let control = FfmpegControl::default();
        control.cancel();
        control.cancel();
        assert!(control.cancelled.load(Ordering::Acquire));
        control.set_progress(0.25);
        assert_eq!(control.progress(), 0.25);
    }

    fn missing_ffmpeg() -> FfmpegRenderer {
        FfmpegRenderer::new(FfmpegSettings {
            ffmpeg_path: PathBuf::from("/nonexistent/bubble-annotate-ffmpeg"),
            video_crf: 18,
            video_preset: "slow".to_string(),
        })
    }

    #[tokio::test]
    async fn test_cancel_before_baking_finishes_skips_encode() {
        let dir = tempfile::tempdir().unwrap();
        let handle = missing_ffmpeg().start(bubble_job(dir.path().join("out.mp4"))).unwrap();
        handle.control.cancel();
        assert!(matches!(handle.completion.await, Err(RenderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_missing_encoder_fails_after_baking() {
        let dir = tempfile::tempdir().unwrap();
        let handle = missing_ffmpeg().start(bubble_job(dir.path().join("out.mp4"))).unwrap();
        assert!(matches!(handle.completion.await, Err(RenderError::Io(_))));
        assert_eq!(handle.control.progress(), 0.0);
    }
}
