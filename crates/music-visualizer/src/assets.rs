//! Decoded images for the background and logo layers.
//!
//! Decoding, scaling and blurring are far too slow for a frame budget, so the
//! results are kept until the configured path, blur radius or output size
//! changes.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::canvas::RasterImage;
use crate::config::RenderConfig;
use crate::error::{Result, VisualizerError};
use crate::surface::Resolution;

#[derive(Clone, Debug, PartialEq)]
struct BackgroundKey {
    path: PathBuf,
    blur: u32,
    resolution: Resolution,
}

#[derive(Debug, Default)]
pub struct LayerAssets {
    source: Option<(PathBuf, RgbaImage)>,
    background_key: Option<BackgroundKey>,
    background: Option<RasterImage>,
    logo_path: Option<PathBuf>,
    logo: Option<RasterImage>,
}

impl LayerAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Background at exactly the output size, blur already applied.
    pub fn background(&self) -> Option<&RasterImage> {
        self.background.as_ref()
    }

    pub fn logo(&self) -> Option<&RasterImage> {
        self.logo.as_ref()
    }

    /// Bring cached images in line with `config`. Failures are logged and
    /// leave the layer empty; a broken image must not stop the frame loop.
    pub fn sync(&mut self, config: &RenderConfig) {
        if let Err(err) = self.sync_background(config) {
            tracing::warn!(%err, "background image unavailable");
            self.background = None;
        }
        if let Err(err) = self.sync_logo(config.logo.image.as_deref()) {
            tracing::warn!(%err, "logo image unavailable");
            self.logo = None;
        }
    }

    pub fn sync_background(&mut self, config: &RenderConfig) -> Result<()> {
        let Some(path) = config.background.image.as_deref() else {
            self.source = None;
            self.background_key = None;
            self.background = None;
            return Ok(());
        };
        let key = BackgroundKey {
            path: path.to_path_buf(),
            blur: (config.background.blur.max(0.0) * 100.0).round() as u32,
            resolution: config.resolution,
        };
        if self.background_key.as_ref() == Some(&key) {
            return Ok(());
        }
        // Mark the key first so a bad file is reported once, not every frame.
        self.background_key = Some(key);
        self.background = None;

        if self.source.as_ref().map(|(p, _)| p.as_path()) != Some(path) {
            self.source = Some((path.to_path_buf(), decode(path)?));
        }
        let Some((_, source)) = &self.source else {
            return Ok(());
        };
        let prepared = prepare_background(source, config.resolution, config.background.blur);
        self.background = Some(RasterImage::from_rgba(&prepared)?);
        tracing::debug!(
            path = %path.display(),
            blur = config.background.blur,
            width = config.resolution.width,
            height = config.resolution.height,
            "background prepared"
        );
        Ok(())
    }

    pub fn sync_logo(&mut self, path: Option<&Path>) -> Result<()> {
        if self.logo_path.as_deref() == path {
            return Ok(());
        }
        self.logo_path = path.map(Path::to_path_buf);
        self.logo = None;
        if let Some(path) = path {
            self.logo = Some(RasterImage::from_rgba(&decode(path)?)?);
            tracing::debug!(path = %path.display(), "logo loaded");
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn decode(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| VisualizerError::image(Some(path.to_path_buf()), e))?;
    Ok(img.to_rgba8())
}

/// Stretch to the output size, then blur with `blur` as the gaussian sigma.
pub fn prepare_background(source: &RgbaImage, resolution: Resolution, blur: f32) -> RgbaImage {
    let resized = imageops::resize(
        source,
        resolution.width,
        resolution.height,
        FilterType::Triangle,
    );
    if blur > 0.0 {
        imageops::blur(&resized, blur)
    } else {
        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn background_matches_output_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RenderConfig::default();
        config.resolution = Resolution::new(64, 36);
        config.background.image = Some(write_png(dir.path(), "bg.png", 10, 10));
        let mut assets = LayerAssets::new();
        assets.sync(&config);
        assert_eq!(assets.background().map(RasterImage::size), Some((64, 36)));
    }

    #[test]
    fn removing_the_path_drops_the_layer() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RenderConfig::default();
        config.resolution = Resolution::new(16, 16);
        config.background.image = Some(write_png(dir.path(), "bg.png", 4, 4));
        config.logo.image = Some(write_png(dir.path(), "logo.png", 8, 4));
        let mut assets = LayerAssets::new();
        assets.sync(&config);
        assert_eq!(assets.logo().map(RasterImage::size), Some((8, 4)));
        config.background.image = None;
        config.logo.image = None;
        assets.sync(&config);
        assert!(assets.background().is_none());
        assert!(assets.logo().is_none());
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let mut config = RenderConfig::default();
        config.background.image = Some(PathBuf::from("/definitely/not/here.png"));
        let mut assets = LayerAssets::new();
        assert!(assets.sync_background(&config).is_err());
        // second sync with the same key stays quiet
        assert!(assets.sync_background(&config).is_ok());
        assert!(assets.background().is_none());
    }

    #[test]
    fn blur_keeps_flat_color() {
        let src = RgbaImage::from_pixel(8, 8, Rgba([50, 100, 150, 255]));
        let out = prepare_background(&src, Resolution::new(16, 16), 2.0);
        assert_eq!(out.dimensions(), (16, 16));
        let px = out.get_pixel(8, 8).0;
        assert!((i32::from(px[1]) - 100).abs() <= 2);
    }
}
