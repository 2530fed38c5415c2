//! Error types for the fallible edges of the engine.
//!
//! Rendering itself never fails: a missing source, surface or envelope makes
//! the frame loop draw less. Errors only come from setup work such as
//! decoding images, reading configuration or writing captured frames.

use std::path::PathBuf;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, VisualizerError>;

#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be decoded or encoded
    #[error("image error for {path:?}: {source}")]
    Image {
        path: Option<PathBuf>,
        #[source]
        source: image::ImageError,
    },

    /// Configuration file is not valid JSON for a `RenderConfig`
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Color string could not be parsed
    #[error("invalid color {0:?}")]
    Color(String),

    /// Requested output size is zero or beyond the supported maximum
    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    /// Backing pixmap could not be allocated
    #[error("failed to allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    /// A capture sink rejected a frame
    #[error("capture failed: {0}")]
    Capture(String),
}

impl VisualizerError {
    pub(crate) fn image(path: Option<PathBuf>, source: image::ImageError) -> Self {
        Self::Image { path, source }
    }
}
