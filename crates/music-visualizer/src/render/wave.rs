use emath::{pos2, Pos2};

use super::DrawContext;
use crate::canvas::Canvas;

const LINE_WIDTH: f32 = 4.0;
const AMPLITUDE: f32 = 0.25;

/// Oscilloscope trace, ending on the center line at the right edge.
fn trace(frame: &[u8], w: f32, h: f32) -> Vec<Pos2> {
    let step = if frame.is_empty() {
        0.0
    } else {
        w / frame.len() as f32
    };
    let mut points: Vec<Pos2> = frame
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let v = (f32::from(s) - 128.0) / 128.0;
            pos2(i as f32 * step, h / 2.0 + v * AMPLITUDE * h)
        })
        .collect();
    points.push(pos2(w, h / 2.0));
    points
}

pub(super) fn draw_line(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    let points = trace(ctx.frame, size.x, size.y);
    canvas.stroke_polyline(&points, LINE_WIDTH, &ctx.fill);
}

pub(super) fn draw_filled(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    let mut points = trace(ctx.frame, size.x, size.y);
    points.push(pos2(size.x, size.y));
    points.push(pos2(0.0, size.y));
    canvas.fill_polygon(&points, &ctx.fill);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_a_flat_center_line() {
        let points = trace(&[128; 4], 100.0, 200.0);
        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|p| p.y == 100.0));
        assert_eq!(points[1].x, 25.0);
        assert_eq!(points[4], pos2(100.0, 100.0));
    }

    #[test]
    fn full_swing_reaches_a_quarter_height() {
        let points = trace(&[0, 255], 10.0, 400.0);
        assert_eq!(points[0].y, 100.0);
        assert!((points[1].y - (200.0 + 127.0 / 128.0 * 100.0)).abs() < 1e-3);
    }
}
