//! Frame synthesis for an audio-reactive music visualizer.
//!
//! Each tick turns one analysis frame plus the current [`RenderConfig`] into
//! a composited picture: background, reactive layer, lyric, logo, timer and
//! progress bar. The desktop shell lives in `music-visualizer-native`.

pub mod assets;
pub mod audio;
pub mod canvas;
pub mod capture;
pub mod color;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame_loop;
pub mod lyrics;
pub mod particles;
pub mod render;
pub mod smoothing;
pub mod surface;
pub mod transport;
pub mod waveform;

pub use audio::{AnalysisDomain, AnalysisSource, DemoSignal};
pub use canvas::{Canvas, DisplayList, PixmapSurface};
pub use capture::{FrameSink, OfflineCapture, PngSequenceSink};
pub use config::{RenderConfig, VisualizerKind};
pub use engine::{FrameInputs, VisualizerEngine};
pub use error::{Result, VisualizerError};
pub use frame_loop::{FrameLoop, FrameScheduler, FrameToken, LoopState, ManualScheduler};
pub use lyrics::{LyricTrack, TimedLyric};
pub use surface::Resolution;
pub use transport::TransportState;
