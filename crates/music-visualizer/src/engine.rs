use crate::assets::LayerAssets;
use crate::audio::AnalysisSource;
use crate::canvas::Canvas;
use crate::compositor::{composite, LayerInputs};
use crate::config::RenderConfig;
use crate::lyrics::TimedLyric;
use crate::particles::ParticleSystem;
use crate::render::{fill_style, DrawContext};
use crate::smoothing::SmoothingBuffer;
use crate::surface::ensure_resolution;
use crate::transport::TransportState;
use crate::waveform::{EnvelopeSlot, WaveformEnvelope};

/// What the shell supplies for one frame.
#[derive(Clone, Copy)]
pub struct FrameInputs<'a> {
    pub config: &'a RenderConfig,
    pub transport: TransportState,
    pub lyric: Option<&'a TimedLyric>,
}

impl<'a> FrameInputs<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            transport: TransportState::default(),
            lyric: None,
        }
    }
}

/// State carried from frame to frame for one playback session.
#[derive(Debug, Default)]
pub struct VisualizerEngine {
    smoothing: SmoothingBuffer,
    particles: ParticleSystem,
    envelope: EnvelopeSlot,
    assets: LayerAssets,
    scratch: Vec<u8>,
}

impl VisualizerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a seeded particle generator, for reproducible frames.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: ParticleSystem::with_seed(seed),
            ..Self::default()
        }
    }

    pub fn smoothing(&self) -> &SmoothingBuffer {
        &self.smoothing
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn envelope(&self) -> Option<&WaveformEnvelope> {
        self.envelope.get()
    }

    pub fn envelope_slot_mut(&mut self) -> &mut EnvelopeSlot {
        &mut self.envelope
    }

    /// Forget everything tied to the previous track.
    pub fn reset(&mut self) {
        self.smoothing.reset();
        self.particles.clear();
        self.envelope.clear();
        tracing::debug!("engine state reset");
    }

    /// Reset and start summarizing the new track's mono samples.
    pub fn load_track(&mut self, samples: Vec<f32>, envelope_points: usize) {
        self.reset();
        tracing::info!(samples = samples.len(), envelope_points, "track loaded");
        self.envelope.begin(samples, envelope_points);
    }

    pub fn render_frame(
        &mut self,
        canvas: &mut dyn Canvas,
        source: Option<&mut dyn AnalysisSource>,
        inputs: &FrameInputs<'_>,
    ) {
        let config = inputs.config;
        self.envelope.poll();
        ensure_resolution(canvas, config.resolution);
        self.assets.sync(config);

        match (config.kind.domain().analysis(), source) {
            (Some(domain), Some(source)) => source.read(domain, &mut self.scratch),
            _ => self.scratch.clear(),
        }

        self.smoothing.set_factor(config.smoothing);
        self.smoothing.ensure_size(config.channel_count);

        let Self {
            smoothing,
            particles,
            envelope,
            assets,
            scratch,
        } = self;
        let mut ctx = DrawContext {
            config,
            frame: scratch,
            smoothing,
            particles,
            envelope: envelope.get(),
            progress: inputs.transport.progress_fraction(),
            fill: fill_style(config, canvas.dimensions().y),
        };
        let layers = LayerInputs {
            assets,
            lyric: inputs.lyric,
            transport: inputs.transport,
        };
        let draw = config.kind.draw_fn();
        composite(canvas, config, layers, |c| draw(c, &mut ctx));
    }
}
