use std::f32::consts::{FRAC_PI_2, TAU};

use emath::{pos2, vec2};

use super::DrawContext;
use crate::canvas::{Canvas, LineCap};
use crate::config::BarStyle;

const INNER_RADIUS: f32 = 0.2;
const MAX_LENGTH: f32 = 0.25;

/// Radial segments around the center, the first pointing straight up.
pub(super) fn draw_circle(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    let center = pos2(size.x / 2.0, size.y / 2.0);
    let min_side = size.x.min(size.y);
    let radius = min_side * INNER_RADIUS;
    let max_length = min_side * MAX_LENGTH;
    let count = ctx.config.channel_count.max(1);
    let slice = TAU / count as f32;
    let line_width = size.x / count as f32 * 0.8;
    let cap = match ctx.config.bar_style {
        BarStyle::Rounded => LineCap::Round,
        BarStyle::Sharp => LineCap::Butt,
    };

    for i in 0..ctx.config.channel_count {
        let raw = f32::from(ctx.sample(i)) / 255.0 * max_length;
        let length = ctx.smoothing.smooth(i, raw);
        let angle = i as f32 * slice - FRAC_PI_2;
        let dir = vec2(angle.cos(), angle.sin());
        let from = center + dir * radius;
        let to = center + dir * (radius + length);
        canvas.stroke_segment(from, to, line_width, cap, &ctx.fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, FillStyle};
    use crate::config::RenderConfig;
    use crate::particles::ParticleSystem;
    use crate::smoothing::SmoothingBuffer;
    use ecolor::Color32;
    use emath::Pos2;

    fn draw(config: &RenderConfig, frame: &[u8]) -> DisplayList {
        let mut canvas = DisplayList::new(400, 200);
        let mut smoothing = SmoothingBuffer::new();
        smoothing.set_factor(config.smoothing);
        smoothing.ensure_size(config.channel_count);
        let mut particles = ParticleSystem::with_seed(0);
        let mut ctx = DrawContext {
            config,
            frame,
            smoothing: &mut smoothing,
            particles: &mut particles,
            envelope: None,
            progress: 0.0,
            fill: FillStyle::Solid(Color32::WHITE),
        };
        draw_circle(&mut canvas, &mut ctx);
        canvas
    }

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn full_scale_segments_span_inner_to_outer_radius() {
        let mut config = RenderConfig::default();
        config.channel_count = 4;
        config.smoothing = 0.0;
        config.bar_style = BarStyle::Rounded;
        let canvas = draw(&config, &[255; 4]);
        let segments: Vec<_> = canvas.segments().collect();
        assert_eq!(segments.len(), 4);

        let center = pos2(200.0, 100.0);
        for (from, to, width, cap) in &segments {
            // min side 200: inner radius 40, full length 50
            assert!(((*from - center).length() - 40.0).abs() < 1e-3);
            assert!(((*to - center).length() - 90.0).abs() < 1e-3);
            assert!((width - 80.0).abs() < 1e-3);
            assert_eq!(*cap, LineCap::Round);
        }

        let (from, to, _, _) = segments[0];
        assert!(close(from, pos2(200.0, 60.0)), "{from:?}");
        assert!(close(to, pos2(200.0, 10.0)), "{to:?}");
        // clockwise from the top in screen space
        assert!(close(segments[1].1, pos2(290.0, 100.0)), "{:?}", segments[1].1);
    }

    #[test]
    fn sharp_style_uses_butt_caps_and_silence_draws_points() {
        let mut config = RenderConfig::default();
        config.channel_count = 8;
        config.smoothing = 0.0;
        config.bar_style = BarStyle::Sharp;
        let canvas = draw(&config, &[0; 8]);
        let segments: Vec<_> = canvas.segments().collect();
        assert_eq!(segments.len(), 8);
        for (from, to, width, cap) in segments {
            assert_eq!(cap, LineCap::Butt);
            assert!(close(from, to));
            assert!((width - 40.0).abs() < 1e-3);
        }
    }
}
