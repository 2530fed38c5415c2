use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context as _;

use music_visualizer::{
    AnalysisSource, DemoSignal, FrameLoop, LyricTrack, ManualScheduler, OfflineCapture,
    PixmapSurface, PngSequenceSink, RenderConfig, VisualizerEngine,
};

use crate::analyser::PcmAnalyser;
use crate::player::DecodedTrack;

/// Everything an offline render needs, owned so it can move to a worker.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub config: RenderConfig,
    pub lyrics: LyricTrack,
    pub track: Option<DecodedTrack>,
    pub out_dir: PathBuf,
    pub fps: u32,
    /// Used when there is no track.
    pub demo_duration: f64,
}

impl ExportRequest {
    pub fn duration(&self) -> f64 {
        self.track
            .as_ref()
            .map_or(self.demo_duration, DecodedTrack::duration)
    }

    /// Render every frame into `out_dir`, then copy the audio next to them.
    pub fn run(&self, cancel: &AtomicBool, done: &AtomicU64) -> anyhow::Result<u64> {
        let resolution = self.config.resolution.validate()?;
        let surface = PixmapSurface::new(resolution.width, resolution.height)?;

        let mut engine = VisualizerEngine::new();
        let source: Box<dyn AnalysisSource + Send> = match &self.track {
            Some(track) => {
                let mono = track.mono();
                engine.load_track(mono.clone(), self.config.envelope_points);
                Box::new(PcmAnalyser::new(Arc::new(mono), track.sample_rate))
            }
            None => Box::new(DemoSignal::default()),
        };

        let mut frame_loop = FrameLoop::new(engine, ManualScheduler::new());
        frame_loop.attach_surface(surface);
        frame_loop.attach_source(source);

        let capture = OfflineCapture::new(self.duration()).with_fps(self.fps);
        let mut sink = PngSequenceSink::new(&self.out_dir);
        let written = capture.run(
            &mut frame_loop,
            &self.config,
            &self.lyrics,
            &mut sink,
            |n, _| {
                done.store(n, Ordering::Relaxed);
                !cancel.load(Ordering::Relaxed)
            },
        )?;
        frame_loop.dispose();

        if let Some(track) = &self.track {
            let wav = self.out_dir.join("audio.wav");
            write_wav(track, &wav)?;
        }
        tracing::info!(
            "mux with: ffmpeg -framerate {} -i {}/frame_%06d.png -i {}/audio.wav -c:v libx264 -pix_fmt yuv420p -c:a aac -shortest out.mp4",
            self.fps,
            self.out_dir.display(),
            self.out_dir.display(),
        );
        Ok(written)
    }
}

fn write_wav(track: &DecodedTrack, path: &Path) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: track.channels,
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &s in track.samples.iter() {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    tracing::debug!(path = %path.display(), "wrote audio track");
    Ok(())
}

/// An export running on a worker thread.
pub struct ExportJob {
    cancel: Arc<AtomicBool>,
    done: Arc<AtomicU64>,
    total: u64,
    handle: Option<JoinHandle<anyhow::Result<u64>>>,
}

impl ExportJob {
    pub fn spawn(request: ExportRequest) -> anyhow::Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let done = Arc::new(AtomicU64::new(0));
        let total = OfflineCapture::new(request.duration())
            .with_fps(request.fps)
            .frame_count();
        let handle = {
            let cancel = Arc::clone(&cancel);
            let done = Arc::clone(&done);
            std::thread::Builder::new()
                .name("export".into())
                .spawn(move || request.run(&cancel, &done))?
        };
        Ok(Self {
            cancel,
            done,
            total,
            handle: Some(handle),
        })
    }

    pub fn progress(&self) -> (u64, u64) {
        (self.done.load(Ordering::Relaxed), self.total)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// `Some` once the worker has exited.
    pub fn try_finish(&mut self) -> Option<anyhow::Result<u64>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(match handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("export thread panicked")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use music_visualizer::Resolution;

    fn tiny_request(dir: &Path, track: Option<DecodedTrack>) -> ExportRequest {
        let mut config = RenderConfig::default();
        config.resolution = Resolution::new(32, 18);
        ExportRequest {
            config,
            lyrics: LyricTrack::default(),
            track,
            out_dir: dir.to_path_buf(),
            fps: 10,
            demo_duration: 0.3,
        }
    }

    #[test]
    fn demo_export_writes_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let request = tiny_request(&dir, None);
        let n = request
            .run(&AtomicBool::new(false), &AtomicU64::new(0))
            .unwrap();
        assert_eq!(n, 3);
        assert!(dir.join("frame_000002.png").is_file());
        assert!(!dir.join("audio.wav").exists());
    }

    #[test]
    fn track_export_copies_audio() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let track = DecodedTrack {
            path: PathBuf::from("tone.wav"),
            channels: 1,
            sample_rate: 8_000,
            samples: Arc::new(vec![0i16; 1_600]),
        };
        let request = tiny_request(&dir, Some(track));
        assert!((request.duration() - 0.2).abs() < 1e-9);
        let n = request
            .run(&AtomicBool::new(false), &AtomicU64::new(0))
            .unwrap();
        assert_eq!(n, 2);
        let reader = hound::WavReader::open(dir.join("audio.wav")).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.len(), 1_600);
    }

    #[test]
    fn cancelled_export_stops_early() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let mut request = tiny_request(&dir, None);
        request.demo_duration = 5.0;
        let n = request
            .run(&AtomicBool::new(true), &AtomicU64::new(0))
            .unwrap();
        assert_eq!(n, 1);
    }
}
