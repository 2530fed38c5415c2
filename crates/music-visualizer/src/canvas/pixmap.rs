use std::path::Path;

use ecolor::Color32;
use emath::{Pos2, Rect, Vec2};
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, GradientStop, LinearGradient, Paint,
    Path as SkPath, PathBuilder, Pixmap, PixmapPaint, Point, SpreadMode, Stroke, Transform,
};

use super::text::TextRenderer;
use super::{Canvas, CornerRadii, FillStyle, FontSpec, Glow, LineCap, TextShadow};
use crate::error::{Result, VisualizerError};

/// Cubic control point distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Decoded RGBA image ready for compositing.
#[derive(Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

impl RasterImage {
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut pixmap =
            Pixmap::new(width, height).ok_or(VisualizerError::Surface { width, height })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(Self { pixmap })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .map_err(|e| VisualizerError::image(Some(path.to_path_buf()), e))?;
        Self::from_rgba(&decoded.to_rgba8())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    pub(crate) fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Raster canvas backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    translation: Vec2,
    glow: Option<Glow>,
    text: TextRenderer,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(VisualizerError::Surface { width, height })?;
        let mut text = TextRenderer::default();
        text.load_fonts();
        Ok(Self {
            pixmap,
            translation: Vec2::ZERO,
            glow: None,
            text,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA8 bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Register an extra font file for lyric and overlay text.
    pub fn load_font_file(&mut self, path: &Path) -> Result<()> {
        self.text.load_font_file(path)
    }

    fn transform(&self) -> Transform {
        Transform::from_translate(self.translation.x, self.translation.y)
    }

    fn fill(&mut self, path: &SkPath, style: &FillStyle) {
        if let Some(glow) = self.glow {
            self.halo(path, 0.0, glow);
        }
        let paint = to_paint(style);
        let transform = self.transform();
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    fn stroke(&mut self, path: &SkPath, width: f32, cap: LineCap, style: &FillStyle) {
        if let Some(glow) = self.glow {
            self.halo(path, width, glow);
        }
        let paint = to_paint(style);
        let stroke = Stroke {
            width,
            line_cap: to_cap(cap),
            line_join: tiny_skia::LineJoin::Round,
            ..Stroke::default()
        };
        let transform = self.transform();
        self.pixmap.stroke_path(path, &paint, &stroke, transform, None);
    }

    /// Two translucent strokes around the shape stand in for a shadow blur.
    fn halo(&mut self, path: &SkPath, base_width: f32, glow: Glow) {
        if glow.blur <= 0.0 {
            return;
        }
        let transform = self.transform();
        for (extra, alpha) in [(glow.blur, 0.12), (glow.blur * 0.5, 0.25)] {
            let paint = solid_paint(crate::color::with_alpha(glow.color, alpha));
            let stroke = Stroke {
                width: base_width + extra,
                line_cap: tiny_skia::LineCap::Round,
                line_join: tiny_skia::LineJoin::Round,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(path, &paint, &stroke, transform, None);
        }
    }
}

impl Canvas for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        match Pixmap::new(width, height) {
            Some(pixmap) => self.pixmap = pixmap,
            None => tracing::warn!(width, height, "could not allocate surface, keeping old size"),
        }
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn set_translation(&mut self, offset: Vec2) {
        self.translation = offset;
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }

    fn fill_rect(&mut self, rect: Rect, style: &FillStyle) {
        let Some(r) = to_rect(rect) else { return };
        let path = PathBuilder::from_rect(r);
        self.fill(&path, style);
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radii: CornerRadii, style: &FillStyle) {
        if let Some(path) = rounded_rect_path(rect, radii) {
            self.fill(&path, style);
        }
    }

    fn stroke_segment(&mut self, from: Pos2, to: Pos2, width: f32, cap: LineCap, style: &FillStyle) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            self.stroke(&path, width, cap, style);
        }
    }

    fn stroke_polyline(&mut self, points: &[Pos2], width: f32, style: &FillStyle) {
        if let Some(path) = polyline_path(points, false) {
            self.stroke(&path, width, LineCap::Round, style);
        }
    }

    fn fill_polygon(&mut self, points: &[Pos2], style: &FillStyle) {
        if let Some(path) = polyline_path(points, true) {
            self.fill(&path, style);
        }
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        if radius <= 0.0 {
            return;
        }
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.fill(&path, &FillStyle::Solid(color));
        }
    }

    fn draw_image(&mut self, image: &RasterImage, dest: Rect, opacity: f32) {
        let (w, h) = image.size();
        if w == 0 || h == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let dest = dest.translate(self.translation);
        let transform = Transform::from_row(
            dest.width() / w as f32,
            0.0,
            0.0,
            dest.height() / h as f32,
            dest.min.x,
            dest.min.y,
        );
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap
            .draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f32 {
        self.text.measure(text, font)
    }

    fn draw_text(
        &mut self,
        text: &str,
        center: Pos2,
        font: &FontSpec,
        color: Color32,
        shadow: Option<TextShadow>,
    ) {
        let Some(sprite) = self.text.sprite(text, font, color, shadow) else {
            return;
        };
        let origin = center + self.translation - sprite.anchor;
        let paint = PixmapPaint::default();
        self.pixmap.draw_pixmap(
            origin.x.round() as i32,
            origin.y.round() as i32,
            sprite.pixmap.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
    }
}

fn to_color(c: Color32) -> Color {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    Color::from_rgba8(r, g, b, a)
}

fn solid_paint(c: Color32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(c));
    paint.anti_alias = true;
    paint
}

fn to_paint(style: &FillStyle) -> Paint<'static> {
    match style {
        FillStyle::Solid(c) => solid_paint(*c),
        FillStyle::Linear {
            from,
            to,
            start,
            end,
        } => {
            let shader = LinearGradient::new(
                Point::from_xy(from.x, from.y),
                Point::from_xy(to.x, to.y),
                vec![
                    GradientStop::new(0.0, to_color(*start)),
                    GradientStop::new(1.0, to_color(*end)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            );
            match shader {
                Some(shader) => {
                    let mut paint = Paint::default();
                    paint.shader = shader;
                    paint.anti_alias = true;
                    paint
                }
                None => solid_paint(*start),
            }
        }
    }
}

fn to_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
    }
}

fn to_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.min.x, rect.min.y, rect.width(), rect.height())
}

fn polyline_path(points: &[Pos2], close: bool) -> Option<SkPath> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Rectangle path with per-corner radii, each clamped to half the shorter side.
pub(crate) fn rounded_rect_path(rect: Rect, radii: CornerRadii) -> Option<SkPath> {
    let (x, y, w, h) = (rect.min.x, rect.min.y, rect.width(), rect.height());
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    if radii.is_zero() {
        return to_rect(rect).map(PathBuilder::from_rect);
    }
    let max = w.min(h) / 2.0;
    let tl = radii.top_left.clamp(0.0, max);
    let tr = radii.top_right.clamp(0.0, max);
    let br = radii.bottom_right.clamp(0.0, max);
    let bl = radii.bottom_left.clamp(0.0, max);

    let mut pb = PathBuilder::new();
    pb.move_to(x + tl, y);
    pb.line_to(x + w - tr, y);
    if tr > 0.0 {
        pb.cubic_to(x + w - tr + tr * KAPPA, y, x + w, y + tr - tr * KAPPA, x + w, y + tr);
    }
    pb.line_to(x + w, y + h - br);
    if br > 0.0 {
        pb.cubic_to(x + w, y + h - br + br * KAPPA, x + w - br + br * KAPPA, y + h, x + w - br, y + h);
    }
    pb.line_to(x + bl, y + h);
    if bl > 0.0 {
        pb.cubic_to(x + bl - bl * KAPPA, y + h, x, y + h - bl + bl * KAPPA, x, y + h - bl);
    }
    pb.line_to(x, y + tl);
    if tl > 0.0 {
        pb.cubic_to(x, y + tl - tl * KAPPA, x + tl - tl * KAPPA, y, x + tl, y);
    }
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emath::{pos2, vec2};

    #[test]
    fn new_surface_is_transparent_and_exact() {
        let surface = PixmapSurface::new(32, 16).unwrap();
        assert_eq!(surface.size(), (32, 16));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.to_rgba().len(), 32 * 16 * 4);
    }

    #[test]
    fn fill_rect_paints_solid_pixels() {
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0));
        surface.fill_rect(rect, &FillStyle::Solid(Color32::from_rgb(255, 0, 0)));
        assert_eq!(surface.pixel(5, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn translation_moves_primitives() {
        let mut surface = PixmapSurface::new(20, 20).unwrap();
        surface.set_translation(vec2(0.0, 10.0));
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(20.0, 5.0));
        surface.fill_rect(rect, &FillStyle::Solid(Color32::WHITE));
        assert_eq!(surface.pixel(10, 2).unwrap()[3], 0);
        assert_eq!(surface.pixel(10, 12).unwrap()[3], 255);
    }

    #[test]
    fn vertical_gradient_runs_top_to_bottom() {
        let mut surface = PixmapSurface::new(4, 100).unwrap();
        let style = FillStyle::Linear {
            from: pos2(0.0, 0.0),
            to: pos2(0.0, 100.0),
            start: Color32::from_rgb(255, 0, 0),
            end: Color32::from_rgb(0, 0, 255),
        };
        surface.fill_rect(Rect::from_min_size(pos2(0.0, 0.0), vec2(4.0, 100.0)), &style);
        let top = surface.pixel(1, 1).unwrap();
        let bottom = surface.pixel(1, 98).unwrap();
        assert!(top[0] > 200 && top[2] < 50);
        assert!(bottom[2] > 200 && bottom[0] < 50);
    }

    #[test]
    fn resize_reallocates_to_exact_size() {
        let mut surface = PixmapSurface::new(8, 8).unwrap();
        surface.resize(1920, 1080);
        assert_eq!(surface.size(), (1920, 1080));
    }

    #[test]
    fn images_scale_into_destination() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
        let raster = RasterImage::from_rgba(&img).unwrap();
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        surface.draw_image(&raster, Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0)), 1.0);
        assert_eq!(surface.pixel(9, 9), Some([0, 255, 0, 255]));
    }

    #[test]
    fn rounded_rect_clamps_radii() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 4.0));
        assert!(rounded_rect_path(rect, CornerRadii::same(50.0)).is_some());
        let empty = Rect::from_min_size(pos2(0.0, 0.0), vec2(0.0, 4.0));
        assert!(rounded_rect_path(empty, CornerRadii::same(1.0)).is_none());
    }
}
