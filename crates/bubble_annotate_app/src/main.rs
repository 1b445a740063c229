// SPDX-License-Identifier: MIT OR Apache-2.0
//! `BubbleAnnotate` - burn speech bubbles and arrows into videos.
//!
//! Command line front end:
//! - `export` renders a project over its source video
//! - `frame` paints the overlay at one instant to a PNG
//! - `inspect` prints the annotation schedule
//! - `add` appends an annotation to a project

use anyhow::{ensure, Context};
use bubble_annotate_app::config::{AppConfig, CONFIG_FILE_NAME};
use bubble_annotate_app::document::{load_project, project_path_for, save_project};
use bubble_annotate_app::ffmpeg::{FfmpegAsset, FfmpegRenderer, FfmpegSettings};
use bubble_annotate_app::state::EditorState;
use bubble_annotate_overlay::{
    build_overlay_tree, default_output_path, render_overlay_at, ExportCompositor, ExportRequest,
    Size, TextRasterizer,
};
use bubble_annotate_sequencer::{
    MediaAsset, OpacityCurve, Project, VideoTransform, DEFAULT_DURATION,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bubble_annotate", version, about = "Annotate videos with bubbles and arrows")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a project over its source video
    Export {
        /// Project document
        project: PathBuf,
        /// Source video, overriding the one stored in the project
        #[arg(long)]
        video: Option<PathBuf>,
        /// Output file; defaults to a timestamped file in the output directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Paint the annotation overlay at one time to a PNG
    Frame {
        /// Project document
        project: PathBuf,
        /// Time in seconds
        #[arg(long)]
        time: f64,
        /// PNG to write
        #[arg(long, short)]
        output: PathBuf,
        /// Probe this video for the frame size and orientation
        #[arg(long)]
        video: Option<PathBuf>,
        /// Frame width when no video is given
        #[arg(long, default_value_t = 1920.0)]
        width: f64,
        /// Frame height when no video is given
        #[arg(long, default_value_t = 1080.0)]
        height: f64,
    },
    /// Print when each annotation is shown
    Inspect {
        /// Project document
        project: PathBuf,
    },
    /// Add an annotation, creating the project next to the video if needed
    Add {
        /// Project document
        #[arg(long)]
        project: Option<PathBuf>,
        /// Source video of a new project
        #[arg(long)]
        video: Option<PathBuf>,
        /// Annotation kind
        #[arg(value_enum)]
        kind: AddKind,
        /// Start time in seconds, snapped to the frame grid
        #[arg(long, default_value_t = 0.0)]
        at: f64,
        /// Bubble text
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AddKind {
    Bubble,
    Arrow,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    init_logging(&config);
    tracing::info!("Starting BubbleAnnotate v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(run(cli.command, config))
}

fn init_logging(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(command: Command, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Command::Export {
            project,
            video,
            output,
        } => export(&config, &project, video, output).await,
        Command::Frame {
            project,
            time,
            output,
            video,
            width,
            height,
        } => frame(&config, &project, time, &output, video, Size::new(width, height)).await,
        Command::Inspect { project } => inspect(&project),
        Command::Add {
            project,
            video,
            kind,
            at,
            text,
        } => add(&config, project, video, kind, at, text),
    }
}

async fn export(
    config: &AppConfig,
    project_path: &Path,
    video: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let project = load_project(project_path)
        .with_context(|| format!("Failed to open {}", project_path.display()))?;
    let video = video
        .or_else(|| project.source_video_path.clone())
        .context("Project has no source video; pass --video")?;
    let source = FfmpegAsset::probe(&config.ffprobe_path, &video)
        .await
        .with_context(|| format!("Failed to probe {}", video.display()))?;

    let renderer = FfmpegRenderer::new(FfmpegSettings {
        ffmpeg_path: config.ffmpeg_path.clone(),
        video_crf: config.video_crf,
        video_preset: config.video_preset.clone(),
    });
    let compositor = Arc::new(ExportCompositor::new(
        Arc::new(renderer),
        config.compositor_config(),
    ));

    let preset = project.export_settings.preset.clone();
    let output_path = output.unwrap_or_else(|| default_output_path(&config.output_dir, &preset));

    let mut updates = compositor.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last_phase = None;
        while updates.changed().await.is_ok() {
            let progress = updates.borrow_and_update().clone();
            if last_phase != Some(progress.phase) {
                tracing::info!("Export {}", progress.phase.name());
                last_phase = Some(progress.phase);
            }
            tracing::debug!("Export progress {:.0}%", progress.progress * 100.0);
            if progress.phase.is_terminal() {
                break;
            }
        }
    });

    let canceller = Arc::clone(&compositor);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling export");
            canceller.cancel();
        }
    });

    let result = compositor
        .export(ExportRequest {
            source: Arc::new(source),
            annotations: project.annotations.to_vec(),
            output_path,
            preset,
        })
        .await;
    interrupt.abort();
    reporter.abort();

    let path = result.context("Export failed")?;
    println!("{}", path.display());
    Ok(())
}

async fn frame(
    config: &AppConfig,
    project_path: &Path,
    time: f64,
    output: &Path,
    video: Option<PathBuf>,
    fallback_size: Size,
) -> anyhow::Result<()> {
    let project = load_project(project_path)
        .with_context(|| format!("Failed to open {}", project_path.display()))?;

    let (size, transform, duration) = match video {
        Some(video) => {
            let source = FfmpegAsset::probe(&config.ffprobe_path, &video)
                .await
                .with_context(|| format!("Failed to probe {}", video.display()))?;
            let track = source
                .video_track()
                .with_context(|| format!("{} has no video track", video.display()))?;
            (
                Size::new(track.natural_width, track.natural_height),
                track.preferred_transform,
                source.duration(),
            )
        }
        None => (
            fallback_size,
            VideoTransform::IDENTITY,
            project.annotations.content_duration(),
        ),
    };
    ensure!(size.is_positive(), "Frame size {}x{} is empty", size.width, size.height);

    let mut rasterizer = TextRasterizer::new();
    let tree = build_overlay_tree(
        &project.annotations.to_vec(),
        size,
        duration,
        transform,
        &mut rasterizer,
    );
    let image = render_overlay_at(&tree, time).context("Failed to paint the overlay")?;
    let png = image.encode_png().context("Failed to encode the frame")?;
    std::fs::write(output, png).with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!("Wrote overlay at {time:.3}s to {}", output.display());
    Ok(())
}

fn inspect(project_path: &Path) -> anyhow::Result<()> {
    let project = load_project(project_path)
        .with_context(|| format!("Failed to open {}", project_path.display()))?;
    let timeline_duration = project.annotations.content_duration();

    println!(
        "{} annotations, source {}",
        project.annotations.len(),
        project
            .source_video_path
            .as_deref()
            .map_or_else(|| "(none)".to_string(), |path| path.display().to_string())
    );
    for item in project.annotations.by_z_order() {
        let annotation = &item.annotation;
        let curve = OpacityCurve::schedule(
            annotation.start_time,
            annotation.end_time,
            timeline_duration,
        );
        let keys: Vec<String> = curve
            .absolute_keyframes()
            .map(|key| format!("{:.3}s={:.0}", key.time, key.value))
            .collect();
        println!(
            "{:<6} {} z={} {:.3}s-{:.3}s [{}]",
            annotation.kind.name(),
            annotation.id,
            annotation.z_index,
            annotation.start_time,
            annotation.end_time,
            keys.join(", ")
        );
    }
    Ok(())
}

fn add(
    config: &AppConfig,
    project_path: Option<PathBuf>,
    video: Option<PathBuf>,
    kind: AddKind,
    at: f64,
    text: Option<String>,
) -> anyhow::Result<()> {
    let project_path = project_path
        .or_else(|| video.as_deref().map(project_path_for))
        .context("Pass --project or --video")?;
    let project = if project_path.exists() {
        load_project(&project_path)
            .with_context(|| format!("Failed to open {}", project_path.display()))?
    } else {
        Project::new(video)
    };
    ensure!(
        text.is_none() || kind == AddKind::Bubble,
        "Only bubbles carry text"
    );

    let mut state = EditorState::new(project).with_undo_depth(config.undo_depth);
    state.duration = state
        .timeline()
        .content_duration()
        .max(at + DEFAULT_DURATION);
    state.playback.seek(at, state.duration);

    let id = match kind {
        AddKind::Bubble => state.add_bubble_at_playhead()?,
        AddKind::Arrow => state.add_arrow_at_playhead()?,
    };
    if let Some(text) = text {
        state.set_bubble_text(id, text)?;
    }

    save_project(&mut state.project, &project_path)
        .with_context(|| format!("Failed to save {}", project_path.display()))?;
    state.mark_saved(project_path);
    println!("{id}");
    Ok(())
}
