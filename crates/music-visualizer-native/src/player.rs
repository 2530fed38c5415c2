use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context as _};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use music_visualizer::TransportState;

/// Fully decoded track, interleaved.
#[derive(Clone, Debug)]
pub struct DecodedTrack {
    pub path: PathBuf,
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Arc<Vec<i16>>,
}

impl DecodedTrack {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("decoding {}", path.display()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        if channels == 0 || sample_rate == 0 {
            bail!("{} has no audio stream", path.display());
        }
        let samples: Vec<i16> = decoder.collect();
        tracing::info!(
            path = %path.display(),
            channels,
            sample_rate,
            seconds = samples.len() as f64 / (f64::from(sample_rate) * f64::from(channels)),
            "track decoded"
        );
        Ok(Self {
            path: path.to_path_buf(),
            channels,
            sample_rate,
            samples: Arc::new(samples),
        })
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "track".to_string(), |n| n.to_string_lossy().into_owned())
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Channel average in -1..1, one value per frame.
    pub fn mono(&self) -> Vec<f32> {
        let channels = usize::from(self.channels.max(1));
        self.samples
            .chunks_exact(channels)
            .map(|frame| {
                frame.iter().map(|&s| f32::from(s) / f32::from(i16::MAX)).sum::<f32>() / channels as f32
            })
            .collect()
    }
}

/// rodio playback of one decoded track with a wall-clock position estimate.
pub struct Player {
    // Dropping the stream silences every sink, so it lives as long as the player.
    _stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
    sink: Option<Sink>,
    track: Option<DecodedTrack>,
    started: Option<Instant>,
    offset: f64,
    volume: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        let (stream, handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(err) => {
                tracing::warn!(%err, "no audio output device, playback will be silent");
                (None, None)
            }
        };
        Self {
            _stream: stream,
            handle,
            sink: None,
            track: None,
            started: None,
            offset: 0.0,
            volume: 0.8,
        }
    }

    pub fn track(&self) -> Option<&DecodedTrack> {
        self.track.as_ref()
    }

    pub fn load(&mut self, track: DecodedTrack) {
        self.stop();
        self.track = Some(track);
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    pub fn position(&self) -> f64 {
        let elapsed = self.started.map_or(0.0, |s| s.elapsed().as_secs_f64());
        let pos = self.offset + elapsed;
        match &self.track {
            Some(t) => pos.min(t.duration()),
            None => pos,
        }
    }

    pub fn transport(&self) -> TransportState {
        TransportState {
            position: self.position(),
            duration: self.track.as_ref().map_or(0.0, DecodedTrack::duration),
            playing: self.is_playing(),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        let at = self.offset;
        self.start_at(at);
    }

    pub fn pause(&mut self) {
        self.offset = self.position();
        self.started = None;
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.started = None;
        self.offset = 0.0;
    }

    /// Seeking restarts playback from the sample nearest `time`.
    pub fn seek(&mut self, time: f64) {
        let was_playing = self.is_playing();
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.started = None;
        let duration = self.track.as_ref().map_or(0.0, DecodedTrack::duration);
        self.offset = time.clamp(0.0, duration);
        if was_playing {
            self.start_at(self.offset);
        }
    }

    /// Playback reached the end of the track.
    pub fn finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn start_at(&mut self, time: f64) {
        let (Some(handle), Some(track)) = (&self.handle, &self.track) else {
            // Silent clock so the visuals still advance without an output device.
            self.offset = time;
            self.started = Some(Instant::now());
            return;
        };
        let channels = usize::from(track.channels);
        let frame = (time * f64::from(track.sample_rate)) as usize;
        let start = (frame * channels).min(track.samples.len());
        let source = SamplesBuffer::new(
            track.channels,
            track.sample_rate,
            track.samples[start..].to_vec(),
        );
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.set_volume(self.volume);
                sink.append(source);
                self.sink = Some(sink);
            }
            Err(err) => tracing::warn!(%err, "could not open an audio sink"),
        }
        self.offset = time;
        self.started = Some(Instant::now());
        tracing::debug!(time, "playback started");
    }
}
