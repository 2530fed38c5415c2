//! Output resolution and surface sizing.
//!
//! The backing surface always has exactly the configured pixel size. How it
//! is scaled on screen is a presentation concern handled by
//! [`fit_to_container`] and never feeds back into draw coordinates.

use emath::{pos2, vec2, Rect};
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::{Result, VisualizerError};

pub const MAX_DIMENSION: u32 = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::FULL_HD
    }
}

impl Resolution {
    pub const HD: Resolution = Resolution::new(1280, 720);
    pub const FULL_HD: Resolution = Resolution::new(1920, 1080);
    pub const QHD: Resolution = Resolution::new(2560, 1440);
    pub const UHD: Resolution = Resolution::new(3840, 2160);
    pub const SQUARE: Resolution = Resolution::new(1080, 1080);
    pub const VERTICAL: Resolution = Resolution::new(1080, 1920);

    pub const PRESETS: [(&'static str, Resolution); 6] = [
        ("720p", Resolution::HD),
        ("1080p", Resolution::FULL_HD),
        ("1440p", Resolution::QHD),
        ("4K", Resolution::UHD),
        ("Square", Resolution::SQUARE),
        ("Vertical", Resolution::VERTICAL),
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(self) -> Result<Self> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_DIMENSION
            || self.height > MAX_DIMENSION
        {
            return Err(VisualizerError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    pub fn clamped(self) -> Self {
        Self::new(
            self.width.clamp(1, MAX_DIMENSION),
            self.height.clamp(1, MAX_DIMENSION),
        )
    }

    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Resize `canvas` to exactly `resolution` if it differs. Returns whether a
/// resize happened.
pub fn ensure_resolution<C: Canvas + ?Sized>(canvas: &mut C, resolution: Resolution) -> bool {
    let resolution = resolution.clamped();
    if canvas.size() == (resolution.width, resolution.height) {
        return false;
    }
    tracing::debug!(
        from = ?canvas.size(),
        to = ?(resolution.width, resolution.height),
        "resizing surface"
    );
    canvas.resize(resolution.width, resolution.height);
    true
}

/// Largest rectangle with the output's aspect ratio centered inside
/// `container`.
pub fn fit_to_container(container: Rect, resolution: Resolution) -> Rect {
    if container.width() <= 0.0 || container.height() <= 0.0 {
        return Rect::from_min_size(container.min, vec2(0.0, 0.0));
    }
    let aspect = resolution.aspect();
    let (w, h) = if container.width() / container.height() > aspect {
        (container.height() * aspect, container.height())
    } else {
        (container.width(), container.width() / aspect)
    };
    let min = pos2(
        container.center().x - w / 2.0,
        container.center().y - h / 2.0,
    );
    Rect::from_min_size(min, vec2(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DisplayList;

    #[test]
    fn resolution_is_exact_after_ensure() {
        let mut canvas = DisplayList::new(640, 480);
        assert!(ensure_resolution(&mut canvas, Resolution::new(1920, 1080)));
        assert_eq!(canvas.size(), (1920, 1080));
        assert!(!ensure_resolution(&mut canvas, Resolution::new(1920, 1080)));
    }

    #[test]
    fn validate_rejects_zero_and_huge() {
        assert!(Resolution::new(0, 10).validate().is_err());
        assert!(Resolution::new(10, 9000).validate().is_err());
        assert!(Resolution::FULL_HD.validate().is_ok());
    }

    #[test]
    fn fit_letterboxes_wide_output_in_tall_container() {
        let container = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0));
        let fitted = fit_to_container(container, Resolution::FULL_HD);
        assert!((fitted.width() - 400.0).abs() < 1e-3);
        assert!((fitted.height() - 225.0).abs() < 1e-3);
        assert!((fitted.center().y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn fit_pillarboxes_tall_output_in_wide_container() {
        let container = Rect::from_min_size(pos2(10.0, 0.0), vec2(1000.0, 500.0));
        let fitted = fit_to_container(container, Resolution::VERTICAL);
        assert!((fitted.height() - 500.0).abs() < 1e-3);
        assert!((fitted.center().x - 510.0).abs() < 1e-3);
    }
}
