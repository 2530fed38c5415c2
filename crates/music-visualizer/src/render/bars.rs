use emath::{pos2, vec2, Rect};

use super::DrawContext;
use crate::canvas::{Canvas, CornerRadii};
use crate::config::BarStyle;

const BAR_FILL: f32 = 0.8;
const MAX_HEIGHT: f32 = 0.8;

struct BarLayout {
    slot: f32,
    width: f32,
    radius: f32,
}

fn layout(ctx: &DrawContext<'_>, w: f32) -> BarLayout {
    let count = ctx.config.channel_count.max(1);
    let slot = w / count as f32;
    let width = slot * BAR_FILL;
    let radius = match ctx.config.bar_style {
        BarStyle::Rounded => width / 2.0,
        BarStyle::Sharp => 0.0,
    };
    BarLayout {
        slot,
        width,
        radius,
    }
}

/// Smoothed height of bar `i`, never shorter than its two corner caps.
fn bar_height(ctx: &mut DrawContext<'_>, i: usize, h: f32, radius: f32) -> f32 {
    let raw = f32::from(ctx.sample(i)) / 255.0 * MAX_HEIGHT * h;
    let smoothed = ctx.smoothing.smooth(i, raw);
    smoothed.max(radius * 2.0)
}

pub(super) fn draw_bars(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    let bars = layout(ctx, size.x);
    let radii = CornerRadii::top(bars.radius);
    for i in 0..ctx.config.channel_count {
        let height = bar_height(ctx, i, size.y, bars.radius);
        let rect = Rect::from_min_size(
            pos2(i as f32 * bars.slot, size.y - height),
            vec2(bars.width, height),
        );
        canvas.fill_rounded_rect(rect, radii, &ctx.fill);
    }
}

pub(super) fn draw_centered_bars(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    let bars = layout(ctx, size.x);
    let radii = CornerRadii::same(bars.radius);
    for i in 0..ctx.config.channel_count {
        let height = bar_height(ctx, i, size.y, bars.radius);
        let rect = Rect::from_min_size(
            pos2(i as f32 * bars.slot, (size.y - height) / 2.0),
            vec2(bars.width, height),
        );
        canvas.fill_rounded_rect(rect, radii, &ctx.fill);
    }
}
