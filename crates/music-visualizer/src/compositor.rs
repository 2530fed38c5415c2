//! Paints one frame in fixed back-to-front layer order.

use ecolor::Color32;
use emath::{pos2, vec2, Pos2, Rect, Vec2};

use crate::assets::LayerAssets;
use crate::canvas::{Canvas, CornerRadii, FillStyle, FontSpec, TextShadow};
use crate::config::{LogoCorner, ProgressEdge, RenderConfig};
use crate::lyrics::TimedLyric;
use crate::transport::TransportState;

pub const LYRIC_BOX_RADIUS: f32 = 15.0;
pub const LYRIC_PADDING: f32 = 0.4;
pub const LYRIC_SHADOW_BLUR: f32 = 5.0;
pub const LOGO_PADDING: f32 = 0.02;
pub const PROGRESS_THICKNESS: f32 = 0.006;
pub const MIN_PROGRESS_THICKNESS: f32 = 4.0;

/// Per-frame inputs of the non-reactive layers.
#[derive(Clone, Copy)]
pub struct LayerInputs<'a> {
    pub assets: &'a LayerAssets,
    pub lyric: Option<&'a TimedLyric>,
    pub transport: TransportState,
}

pub fn composite(
    canvas: &mut dyn Canvas,
    config: &RenderConfig,
    layers: LayerInputs<'_>,
    visualization: impl FnOnce(&mut dyn Canvas),
) {
    let size = canvas.dimensions();
    let full = Rect::from_min_size(Pos2::ZERO, size);

    canvas.clear();
    canvas.fill_rect(full, &FillStyle::Solid(config.background.color));

    if let Some(bg) = layers.assets.background() {
        canvas.draw_image(bg, full, config.background.opacity);
    }

    canvas.set_translation(vec2(0.0, config.vertical_offset(size.y)));
    canvas.set_glow(Some(crate::render::glow(config)));
    visualization(&mut *canvas);
    canvas.set_glow(None);
    canvas.set_translation(Vec2::ZERO);

    if let Some(lyric) = layers.lyric {
        draw_lyric(canvas, config, &lyric.text);
    }
    draw_logo(canvas, config, layers.assets);
    let bar = progress_bar_rect(config, size);
    if config.overlays.show_timer {
        draw_timer(canvas, config, &layers.transport, bar);
    }
    if let Some(bar) = bar {
        draw_progress(canvas, config, &layers.transport, bar);
    }
}

fn draw_lyric(canvas: &mut dyn Canvas, config: &RenderConfig, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let size = canvas.dimensions();
    let style = &config.lyrics;
    let font = FontSpec::new(style.font_family.as_str(), style.font_size);
    let text_width = canvas.measure_text(text, &font);
    let padding = style.font_size * LYRIC_PADDING;
    let center = pos2(
        size.x * style.position_x / 100.0,
        size.y * style.position_y / 100.0,
    );
    let box_size = vec2(
        text_width + padding * 2.0,
        style.font_size + padding * 2.0,
    );
    canvas.fill_rounded_rect(
        Rect::from_center_size(center, box_size),
        CornerRadii::same(LYRIC_BOX_RADIUS),
        &FillStyle::Solid(style.highlight_color),
    );
    canvas.draw_text(
        text,
        center,
        &font,
        style.font_color,
        Some(TextShadow {
            color: Color32::BLACK,
            blur: LYRIC_SHADOW_BLUR,
        }),
    );
}

/// Destination of the logo, aspect preserved, or `None` if there is nothing
/// to draw.
pub fn logo_rect(config: &RenderConfig, surface: Vec2, image_size: (u32, u32)) -> Option<Rect> {
    let (iw, ih) = image_size;
    if iw == 0 || ih == 0 || config.logo.size <= 0.0 {
        return None;
    }
    let w = surface.x * config.logo.size / 100.0;
    let h = w * ih as f32 / iw as f32;
    let pad = surface.x * LOGO_PADDING;
    let min = match config.logo.corner {
        LogoCorner::TopLeft => pos2(pad, pad),
        LogoCorner::TopRight => pos2(surface.x - w - pad, pad),
        LogoCorner::BottomLeft => pos2(pad, surface.y - h - pad),
        LogoCorner::BottomRight => pos2(surface.x - w - pad, surface.y - h - pad),
        LogoCorner::Center => pos2((surface.x - w) / 2.0, (surface.y - h) / 2.0),
    };
    Some(Rect::from_min_size(min, vec2(w, h)))
}

fn draw_logo(canvas: &mut dyn Canvas, config: &RenderConfig, assets: &LayerAssets) {
    let Some(logo) = assets.logo() else { return };
    if let Some(dest) = logo_rect(config, canvas.dimensions(), logo.size()) {
        canvas.draw_image(logo, dest, config.logo.opacity);
    }
}

fn draw_timer(
    canvas: &mut dyn Canvas,
    config: &RenderConfig,
    transport: &TransportState,
    bar: Option<Rect>,
) {
    let size = canvas.dimensions();
    let label = transport.timer_label();
    let font = FontSpec::new(config.lyrics.font_family.as_str(), (size.y * 0.03).max(12.0));
    let width = canvas.measure_text(&label, &font);
    let pad = size.x * LOGO_PADDING;
    let bottom = match bar {
        Some(bar) if config.overlays.progress_edge == ProgressEdge::Bottom => bar.min.y,
        _ => size.y,
    };
    let center = pos2(size.x - pad - width / 2.0, bottom - pad - font.size / 2.0);
    canvas.draw_text(
        &label,
        center,
        &font,
        Color32::WHITE,
        Some(TextShadow {
            color: Color32::BLACK,
            blur: LYRIC_SHADOW_BLUR,
        }),
    );
}

/// Full-width track of the progress bar when it is enabled.
pub fn progress_bar_rect(config: &RenderConfig, surface: Vec2) -> Option<Rect> {
    if !config.overlays.show_progress {
        return None;
    }
    let thickness = (surface.y * PROGRESS_THICKNESS).max(MIN_PROGRESS_THICKNESS);
    let y = match config.overlays.progress_edge {
        ProgressEdge::Top => 0.0,
        ProgressEdge::Bottom => surface.y - thickness,
    };
    Some(Rect::from_min_size(pos2(0.0, y), vec2(surface.x, thickness)))
}

fn draw_progress(canvas: &mut dyn Canvas, config: &RenderConfig, transport: &TransportState, bar: Rect) {
    canvas.fill_rect(
        bar,
        &FillStyle::Solid(Color32::from_rgba_unmultiplied(255, 255, 255, 51)),
    );
    let fraction = transport.progress_fraction();
    if fraction <= 0.0 {
        return;
    }
    let filled = Rect::from_min_size(bar.min, vec2(bar.width() * fraction, bar.height()));
    let style = if config.gradient {
        FillStyle::Linear {
            from: pos2(0.0, bar.min.y),
            to: pos2(bar.width(), bar.min.y),
            start: config.primary,
            end: config.secondary,
        }
    } else {
        FillStyle::Solid(config.primary)
    };
    canvas.fill_rect(filled, &style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand};

    fn frame(config: &RenderConfig, lyric: Option<&TimedLyric>, transport: TransportState) -> DisplayList {
        let mut canvas = DisplayList::new(1000, 500);
        let assets = LayerAssets::new();
        composite(
            &mut canvas,
            config,
            LayerInputs {
                assets: &assets,
                lyric,
                transport,
            },
            |c| c.fill_circle(pos2(10.0, 10.0), 5.0, Color32::RED),
        );
        canvas
    }

    #[test]
    fn layers_paint_back_to_front() {
        let mut config = RenderConfig::default();
        config.overlays.show_timer = true;
        config.overlays.show_progress = true;
        let lyric = TimedLyric::new(0.0, "hello");
        let canvas = frame(&config, Some(&lyric), TransportState::new(30.0, 60.0, true));
        let cmds = canvas.commands();
        assert!(matches!(cmds[0], DrawCommand::Clear));
        assert!(matches!(cmds[1], DrawCommand::FillRect { .. }));
        assert!(matches!(cmds[2], DrawCommand::Circle { .. }));
        assert!(matches!(cmds[3], DrawCommand::RoundedRect { .. }));
        assert!(matches!(cmds[4], DrawCommand::Text { .. }));
        assert_eq!(canvas.texts().collect::<Vec<_>>(), vec!["hello", "00:30 / 01:00"]);
    }

    #[test]
    fn visualization_is_offset_and_glow_reset() {
        let mut config = RenderConfig::default();
        config.position = 100.0;
        let canvas = frame(&config, None, TransportState::default());
        let (center, _, _) = canvas.circles().next().unwrap();
        assert_eq!(*center, pos2(10.0, 135.0));
        let glows: Vec<_> = canvas
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { glow, .. } => Some(*glow),
                _ => None,
            })
            .collect();
        assert_eq!(glows, vec![None]);
    }

    #[test]
    fn lyric_box_is_sized_from_text() {
        let config = RenderConfig::default();
        let lyric = TimedLyric::new(0.0, "abcd");
        let canvas = frame(&config, Some(&lyric), TransportState::default());
        let (rect, radii) = canvas.rounded_rects().next().unwrap();
        // 4 chars * 32 * 0.55 = 70.4, padding 12.8 on each side
        assert!((rect.width() - 96.0).abs() < 1e-3);
        assert!((rect.height() - 57.6).abs() < 1e-3);
        assert!((rect.center() - pos2(500.0, 250.0)).length() < 1e-3);
        assert_eq!(*radii, CornerRadii::same(LYRIC_BOX_RADIUS));
    }

    #[test]
    fn progress_fill_tracks_position() {
        let mut config = RenderConfig::default();
        config.overlays.show_progress = true;
        let canvas = frame(&config, None, TransportState::new(15.0, 60.0, true));
        let rects: Vec<Rect> = canvas
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        // background, track, filled part
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[1].height(), 4.0);
        assert_eq!(rects[1].max.y, 500.0);
        assert!((rects[2].width() - 250.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_duration_draws_empty_track() {
        let mut config = RenderConfig::default();
        config.overlays.show_progress = true;
        config.overlays.progress_edge = ProgressEdge::Top;
        let canvas = frame(&config, None, TransportState::new(15.0, 0.0, true));
        let count = canvas
            .last_frame()
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn logo_corners() {
        let mut config = RenderConfig::default();
        let surface = vec2(1000.0, 500.0);
        let r = logo_rect(&config, surface, (200, 100)).unwrap();
        assert_eq!(r, Rect::from_min_size(pos2(880.0, 20.0), vec2(100.0, 50.0)));
        config.logo.corner = LogoCorner::BottomLeft;
        let r = logo_rect(&config, surface, (200, 100)).unwrap();
        assert_eq!(r.min, pos2(20.0, 430.0));
        config.logo.corner = LogoCorner::Center;
        let r = logo_rect(&config, surface, (200, 100)).unwrap();
        assert_eq!(r.center(), pos2(500.0, 250.0));
        assert!(logo_rect(&config, surface, (0, 100)).is_none());
    }
}
