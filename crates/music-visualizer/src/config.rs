//! Render settings read by the engine every frame.
//!
//! The engine never mutates a `RenderConfig`; the shell edits it and hands a
//! reference to each tick. Files are JSON with every field optional.

use std::path::{Path, PathBuf};

use ecolor::Color32;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::surface::Resolution;

pub const MAX_CHANNELS: usize = 512;
pub const MAX_SMOOTHING: f32 = 0.95;
pub const DEFAULT_ENVELOPE_POINTS: usize = 2000;
pub const DEFAULT_PARTICLE_CAP: usize = 2000;

/// Which draw algorithm runs for the reactive layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizerKind {
    #[default]
    #[serde(alias = "bar")]
    Bars,
    #[serde(alias = "bar-center")]
    CenteredBars,
    #[serde(alias = "circle")]
    Circular,
    #[serde(alias = "wave")]
    WaveformLine,
    #[serde(alias = "wave-fill")]
    WaveformFilled,
    ParticleField,
    ProgressWaveform,
}

impl VisualizerKind {
    pub const ALL: [VisualizerKind; 7] = [
        VisualizerKind::Bars,
        VisualizerKind::CenteredBars,
        VisualizerKind::Circular,
        VisualizerKind::WaveformLine,
        VisualizerKind::WaveformFilled,
        VisualizerKind::ParticleField,
        VisualizerKind::ProgressWaveform,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VisualizerKind::Bars => "Bars",
            VisualizerKind::CenteredBars => "Centered bars",
            VisualizerKind::Circular => "Circle",
            VisualizerKind::WaveformLine => "Wave",
            VisualizerKind::WaveformFilled => "Filled wave",
            VisualizerKind::ParticleField => "Particles",
            VisualizerKind::ProgressWaveform => "Progress wave",
        }
    }

    /// Modes whose output depends on the per-channel smoothing buffer.
    pub fn uses_channels(self) -> bool {
        matches!(
            self,
            VisualizerKind::Bars | VisualizerKind::CenteredBars | VisualizerKind::Circular
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarStyle {
    Sharp,
    #[default]
    Rounded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressEdge {
    Top,
    #[default]
    Bottom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    #[serde(with = "crate::color::css")]
    pub color: Color32,
    pub image: Option<PathBuf>,
    /// 0..1
    pub opacity: f32,
    /// Blur radius in pixels, 0 disables.
    pub blur: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: Color32::from_rgb(0x10, 0x10, 0x1E),
            image: None,
            opacity: 0.3,
            blur: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricStyle {
    pub font_size: f32,
    #[serde(with = "crate::color::css")]
    pub font_color: Color32,
    #[serde(with = "crate::color::css")]
    pub highlight_color: Color32,
    /// Horizontal center of the lyric box, percent of surface width.
    pub position_x: f32,
    /// Vertical center of the lyric box, percent of surface height.
    pub position_y: f32,
    pub font_family: String,
}

impl Default for LyricStyle {
    fn default() -> Self {
        Self {
            font_size: 32.0,
            font_color: Color32::WHITE,
            highlight_color: Color32::from_rgba_unmultiplied(224, 64, 251, 102),
            position_x: 50.0,
            position_y: 50.0,
            font_family: "Ubuntu, sans-serif".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub image: Option<PathBuf>,
    /// Logo width as percent of surface width.
    pub size: f32,
    pub opacity: f32,
    pub corner: LogoCorner,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            image: None,
            size: 10.0,
            opacity: 1.0,
            corner: LogoCorner::TopRight,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub show_timer: bool,
    pub show_progress: bool,
    pub progress_edge: ProgressEdge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub kind: VisualizerKind,
    /// Bars or circle segments.
    pub channel_count: usize,
    pub smoothing: f32,
    #[serde(with = "crate::color::css")]
    pub primary: Color32,
    #[serde(with = "crate::color::css")]
    pub secondary: Color32,
    pub gradient: bool,
    pub bar_style: BarStyle,
    /// Vertical placement of the reactive layer, 50 = centered.
    pub position: f32,
    pub background: BackgroundConfig,
    pub lyrics: LyricStyle,
    pub logo: LogoConfig,
    pub overlays: OverlayConfig,
    pub resolution: Resolution,
    pub envelope_points: usize,
    pub particle_cap: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            kind: VisualizerKind::Bars,
            channel_count: 128,
            smoothing: 0.5,
            primary: Color32::from_rgb(0xE0, 0x40, 0xFB),
            secondary: Color32::from_rgb(0x00, 0xF5, 0xD4),
            gradient: true,
            bar_style: BarStyle::Rounded,
            position: 50.0,
            background: BackgroundConfig::default(),
            lyrics: LyricStyle::default(),
            logo: LogoConfig::default(),
            overlays: OverlayConfig::default(),
            resolution: Resolution::FULL_HD,
            envelope_points: DEFAULT_ENVELOPE_POINTS,
            particle_cap: DEFAULT_PARTICLE_CAP,
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), kind = ?config.kind, "loaded render config");
        Ok(config)
    }

    /// Copy with every field clamped into its legal range.
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.channel_count = c.channel_count.clamp(1, MAX_CHANNELS);
        c.smoothing = finite_or(c.smoothing, 0.0).clamp(0.0, MAX_SMOOTHING);
        c.position = finite_or(c.position, 50.0).clamp(0.0, 100.0);
        c.background.opacity = finite_or(c.background.opacity, 1.0).clamp(0.0, 1.0);
        c.background.blur = finite_or(c.background.blur, 0.0).max(0.0);
        c.lyrics.font_size = finite_or(c.lyrics.font_size, 32.0).clamp(4.0, 400.0);
        c.lyrics.position_x = finite_or(c.lyrics.position_x, 50.0).clamp(0.0, 100.0);
        c.lyrics.position_y = finite_or(c.lyrics.position_y, 50.0).clamp(0.0, 100.0);
        c.logo.size = finite_or(c.logo.size, 10.0).clamp(0.0, 100.0);
        c.logo.opacity = finite_or(c.logo.opacity, 1.0).clamp(0.0, 1.0);
        c.resolution = c.resolution.clamped();
        c.envelope_points = c.envelope_points.max(1);
        c
    }

    /// Vertical offset of the reactive layer in pixels for a surface of `height`.
    pub fn vertical_offset(&self, height: f32) -> f32 {
        ((self.position - 50.0) / 50.0) * (height / 4.0)
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
