//! Offline rendering: frames at a fixed rate on a virtual clock, handed to a
//! [`FrameSink`].

use std::path::{Path, PathBuf};

use crate::canvas::PixmapSurface;
use crate::config::RenderConfig;
use crate::engine::FrameInputs;
use crate::error::{Result, VisualizerError};
use crate::frame_loop::{FrameLoop, ManualScheduler};
use crate::lyrics::LyricTrack;
use crate::surface::Resolution;
use crate::transport::TransportState;

pub const DEFAULT_FPS: u32 = 30;

/// One rendered frame, straight-alpha RGBA8, row-major.
#[derive(Debug)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

pub trait FrameSink {
    fn begin(&mut self, resolution: Resolution, fps: u32) -> Result<()>;

    fn write_frame(&mut self, index: u64, frame: &Frame<'_>) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, resolution: Resolution, fps: u32) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        self.written = 0;
        tracing::info!(
            dir = %self.dir.display(),
            width = resolution.width,
            height = resolution.height,
            fps,
            "writing png sequence"
        );
        Ok(())
    }

    fn write_frame(&mut self, index: u64, frame: &Frame<'_>) -> Result<()> {
        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.to_vec())
            .ok_or_else(|| {
                VisualizerError::Capture(format!(
                    "frame {index} has {} bytes, expected {}x{}x4",
                    frame.rgba.len(),
                    frame.width,
                    frame.height
                ))
            })?;
        let path = self.frame_path(index);
        image
            .save(&path)
            .map_err(|e| VisualizerError::image(Some(path), e))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!(frames = self.written, dir = %self.dir.display(), "png sequence complete");
        Ok(())
    }
}

/// Renders `duration` seconds at `fps`, independent of wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfflineCapture {
    pub fps: u32,
    pub duration: f64,
}

impl OfflineCapture {
    pub fn new(duration: f64) -> Self {
        Self {
            fps: DEFAULT_FPS,
            duration,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn frame_count(&self) -> u64 {
        if self.fps == 0 || !self.duration.is_finite() || self.duration <= 0.0 {
            return 0;
        }
        (self.duration * f64::from(self.fps)).ceil() as u64
    }

    /// Drive `frame_loop` frame by frame into `sink`. `progress` sees
    /// `(done, total)` after every frame and stops the capture by returning
    /// false. Returns the number of frames written.
    pub fn run(
        &self,
        frame_loop: &mut FrameLoop<PixmapSurface, ManualScheduler>,
        config: &RenderConfig,
        lyrics: &LyricTrack,
        sink: &mut dyn FrameSink,
        mut progress: impl FnMut(u64, u64) -> bool,
    ) -> Result<u64> {
        let resolution = config.resolution.validate()?;
        let total = self.frame_count();

        // First frame must already see the envelope.
        frame_loop.engine_mut().envelope_slot_mut().wait();

        frame_loop.set_playing(true);
        if !frame_loop.start() {
            return Err(VisualizerError::Capture(
                "capture needs both a surface and an analysis source".into(),
            ));
        }
        sink.begin(resolution, self.fps)?;

        let mut written = 0;
        for index in 0..total {
            let time = index as f64 / f64::from(self.fps);
            let Some(token) = frame_loop.scheduler_mut().next_due() else {
                return Err(VisualizerError::Capture(format!("no frame scheduled at {index}")));
            };
            let inputs = FrameInputs {
                config,
                transport: TransportState::new(time, self.duration, true),
                lyric: lyrics.active_at(time),
            };
            if !frame_loop.tick(token, &inputs) {
                return Err(VisualizerError::Capture(format!("frame {index} was not drawn")));
            }
            let Some(surface) = frame_loop.canvas() else {
                return Err(VisualizerError::Capture("surface detached during capture".into()));
            };
            let (width, height) = crate::canvas::Canvas::size(surface);
            let rgba = surface.to_rgba();
            sink.write_frame(
                index,
                &Frame {
                    width,
                    height,
                    rgba: &rgba,
                },
            )?;
            written += 1;
            if !progress(written, total) {
                tracing::info!(written, total, "capture cancelled");
                break;
            }
        }

        frame_loop.stop();
        sink.finish()?;
        Ok(written)
    }
}
