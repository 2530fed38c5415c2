//! Per-type draw algorithms for the reactive layer.
//!
//! Each [`VisualizerKind`] maps to one plain function through a static
//! table; the compositor only ever calls [`VisualizerKind::draw_fn`].

mod bars;
mod circle;
mod particles;
mod progress_wave;
mod wave;

use ecolor::Color32;
use emath::pos2;

use crate::audio::AnalysisDomain;
use crate::canvas::{Canvas, FillStyle, Glow};
use crate::config::RenderConfig;
use crate::particles::ParticleSystem;
use crate::smoothing::SmoothingBuffer;
use crate::waveform::WaveformEnvelope;

pub use crate::config::VisualizerKind;

pub const GLOW_BLUR: f32 = 10.0;

/// Color of unplayed progress-waveform bars.
pub fn unplayed_color() -> Color32 {
    Color32::from_rgba_unmultiplied(255, 255, 255, 64)
}

/// Input a draw algorithm consumes each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataDomain {
    Frequency,
    Time,
    /// Track-wide envelope; no per-frame analysis is read.
    Envelope,
}

impl DataDomain {
    pub fn analysis(self) -> Option<AnalysisDomain> {
        match self {
            DataDomain::Frequency => Some(AnalysisDomain::Frequency),
            DataDomain::Time => Some(AnalysisDomain::Time),
            DataDomain::Envelope => None,
        }
    }
}

/// Everything a draw function may read or advance for one frame.
pub struct DrawContext<'a> {
    pub config: &'a RenderConfig,
    pub frame: &'a [u8],
    pub smoothing: &'a mut SmoothingBuffer,
    pub particles: &'a mut ParticleSystem,
    pub envelope: Option<&'a WaveformEnvelope>,
    /// Played share of the track, `0..=1`.
    pub progress: f32,
    pub fill: FillStyle,
}

impl DrawContext<'_> {
    /// Frame byte at `i`, 0 past the end.
    fn sample(&self, i: usize) -> u8 {
        self.frame.get(i).copied().unwrap_or(0)
    }
}

pub type DrawFn = fn(&mut dyn Canvas, &mut DrawContext<'_>);

/// Indexed in [`VisualizerKind::ALL`] order.
static DRAW_TABLE: [DrawFn; 7] = [
    bars::draw_bars,
    bars::draw_centered_bars,
    circle::draw_circle,
    wave::draw_line,
    wave::draw_filled,
    particles::draw_particles,
    progress_wave::draw_progress_wave,
];

impl VisualizerKind {
    pub fn draw_fn(self) -> DrawFn {
        DRAW_TABLE[self as usize]
    }

    pub fn domain(self) -> DataDomain {
        match self {
            VisualizerKind::Bars | VisualizerKind::CenteredBars | VisualizerKind::Circular => {
                DataDomain::Frequency
            }
            VisualizerKind::WaveformLine
            | VisualizerKind::WaveformFilled
            | VisualizerKind::ParticleField => DataDomain::Time,
            VisualizerKind::ProgressWaveform => DataDomain::Envelope,
        }
    }
}

/// Solid primary, or a top-to-bottom primary→secondary gradient over the
/// surface height.
pub fn fill_style(config: &RenderConfig, height: f32) -> FillStyle {
    if config.gradient {
        FillStyle::Linear {
            from: pos2(0.0, 0.0),
            to: pos2(0.0, height),
            start: config.primary,
            end: config.secondary,
        }
    } else {
        FillStyle::Solid(config.primary)
    }
}

pub fn glow(config: &RenderConfig) -> Glow {
    Glow {
        color: config.primary,
        blur: GLOW_BLUR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_kinds() {
        for (i, kind) in VisualizerKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn domains() {
        assert_eq!(VisualizerKind::Bars.domain(), DataDomain::Frequency);
        assert_eq!(VisualizerKind::CenteredBars.domain(), DataDomain::Frequency);
        assert_eq!(VisualizerKind::Circular.domain(), DataDomain::Frequency);
        assert_eq!(VisualizerKind::WaveformLine.domain(), DataDomain::Time);
        assert_eq!(VisualizerKind::WaveformFilled.domain(), DataDomain::Time);
        assert_eq!(VisualizerKind::ProgressWaveform.domain().analysis(), None);
        assert_eq!(
            VisualizerKind::ParticleField.domain().analysis(),
            Some(AnalysisDomain::Time)
        );
    }

    #[test]
    fn gradient_toggle() {
        let mut config = RenderConfig::default();
        config.gradient = false;
        assert_eq!(fill_style(&config, 100.0), FillStyle::Solid(config.primary));
        config.gradient = true;
        assert!(matches!(fill_style(&config, 100.0), FillStyle::Linear { .. }));
    }
}
