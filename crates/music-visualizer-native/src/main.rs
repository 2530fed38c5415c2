mod analyser;
mod app;
mod export;
mod player;
mod ui;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use music_visualizer::capture::DEFAULT_FPS;
use music_visualizer::{LyricTrack, RenderConfig};

use crate::app::VisualizerApp;
use crate::export::ExportRequest;
use crate::player::DecodedTrack;

#[derive(Parser, Debug)]
#[command(name = "music-visualizer")]
#[command(about = "Audio-reactive visualizer with lyric, logo and progress overlays", long_about = None)]
struct Args {
    /// Audio file to load on start
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,

    /// JSON render settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Timed lyrics, one `[mm:ss.xx] text` line each
    #[arg(long, value_name = "FILE")]
    lyrics: Option<PathBuf>,

    /// Render a PNG sequence into DIR without opening a window
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Export frame rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Export length in seconds when no audio is given
    #[arg(long, value_name = "SECONDS", default_value_t = 10.0)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => RenderConfig::default(),
    };
    let lyrics = match &args.lyrics {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading lyrics from {}", path.display()))?;
            LyricTrack::parse(&text)
        }
        None => LyricTrack::default(),
    };
    let track = args.audio.as_deref().map(DecodedTrack::open).transpose()?;

    if let Some(out_dir) = args.export {
        let request = ExportRequest {
            config,
            lyrics,
            track,
            out_dir,
            fps: args.fps,
            demo_duration: args.duration,
        };
        let written = request.run(&AtomicBool::new(false), &AtomicU64::new(0))?;
        tracing::info!(frames = written, dir = %request.out_dir.display(), "export finished");
        return Ok(());
    }

    eframe::run_native(
        "Music Visualizer",
        eframe::NativeOptions::default(),
        Box::new(move |cc| Ok(Box::new(VisualizerApp::new(&cc.egui_ctx, config, lyrics, track)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start native app: {e}"))
}
