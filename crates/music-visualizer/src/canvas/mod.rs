//! Immediate-mode 2D drawing surface.
//!
//! Draw algorithms and the compositor only talk to [`Canvas`]. The raster
//! backend is [`PixmapSurface`]; [`DisplayList`] records the same calls as
//! plain data so a frame can be inspected without touching pixels.

mod display_list;
mod pixmap;
mod text;

use ecolor::Color32;
use emath::{Pos2, Rect, Vec2};

pub use display_list::{DisplayList, DrawCommand};
pub use pixmap::{PixmapSurface, RasterImage};

#[derive(Clone, Debug, PartialEq)]
pub enum FillStyle {
    Solid(Color32),
    /// Two-stop linear gradient in surface coordinates.
    Linear {
        from: Pos2,
        to: Pos2,
        start: Color32,
        end: Color32,
    },
}

impl FillStyle {
    /// Color used where a single representative color is needed.
    pub fn primary(&self) -> Color32 {
        match self {
            FillStyle::Solid(c) => *c,
            FillStyle::Linear { start, .. } => *start,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerRadii {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadii {
    pub const ZERO: CornerRadii = CornerRadii::same(0.0);

    pub const fn same(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub const fn top(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: 0.0,
            bottom_left: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top_left <= 0.0
            && self.top_right <= 0.0
            && self.bottom_right <= 0.0
            && self.bottom_left <= 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

/// Colored halo drawn beneath every primitive while set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub color: Color32,
    pub blur: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextShadow {
    pub color: Color32,
    pub blur: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: true,
        }
    }
}

pub trait Canvas {
    /// Backing size in pixels.
    fn size(&self) -> (u32, u32);

    /// Reallocate the backing store; contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Make every pixel transparent.
    fn clear(&mut self);

    /// Offset applied to all subsequent primitives.
    fn set_translation(&mut self, offset: Vec2);

    fn set_glow(&mut self, glow: Option<Glow>);

    fn fill_rect(&mut self, rect: Rect, style: &FillStyle);

    fn fill_rounded_rect(&mut self, rect: Rect, radii: CornerRadii, style: &FillStyle);

    fn stroke_segment(&mut self, from: Pos2, to: Pos2, width: f32, cap: LineCap, style: &FillStyle);

    fn stroke_polyline(&mut self, points: &[Pos2], width: f32, style: &FillStyle);

    fn fill_polygon(&mut self, points: &[Pos2], style: &FillStyle);

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32);

    fn draw_image(&mut self, image: &RasterImage, dest: Rect, opacity: f32);

    /// Advance width of `text` in pixels.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f32;

    /// Draw `text` centered on `center`.
    fn draw_text(
        &mut self,
        text: &str,
        center: Pos2,
        font: &FontSpec,
        color: Color32,
        shadow: Option<TextShadow>,
    );

    fn dimensions(&self) -> Vec2 {
        let (w, h) = self.size();
        Vec2::new(w as f32, h as f32)
    }
}
