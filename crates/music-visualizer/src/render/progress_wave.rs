use emath::{pos2, vec2, Rect};

use super::{unplayed_color, DrawContext};
use crate::canvas::{Canvas, FillStyle};

/// Whole-track envelope with the played part in the fill style. Nothing is
/// drawn until the envelope is ready.
pub(super) fn draw_progress_wave(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let Some(envelope) = ctx.envelope else {
        return;
    };
    let points = envelope.points();
    if points.is_empty() {
        return;
    }
    let size = canvas.dimensions();
    let n = points.len() as f32;
    let slot = size.x / n;
    let unplayed = FillStyle::Solid(unplayed_color());
    for (i, amp) in points.iter().enumerate() {
        let height = (amp * 0.8 * size.y).max(1.0);
        let rect = Rect::from_min_size(
            pos2(i as f32 * slot, (size.y - height) / 2.0),
            vec2(slot, height),
        );
        let played = i as f32 / n <= ctx.progress;
        canvas.fill_rect(rect, if played { &ctx.fill } else { &unplayed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand};
    use crate::config::RenderConfig;
    use crate::particles::ParticleSystem;
    use crate::smoothing::SmoothingBuffer;
    use crate::waveform::{summarize, WaveformEnvelope};
    use ecolor::Color32;

    fn draw(envelope: &WaveformEnvelope, progress: f32) -> DisplayList {
        let config = RenderConfig::default();
        let mut canvas = DisplayList::new(400, 200);
        let mut smoothing = SmoothingBuffer::new();
        let mut particles = ParticleSystem::with_seed(0);
        let mut ctx = DrawContext {
            config: &config,
            frame: &[],
            smoothing: &mut smoothing,
            particles: &mut particles,
            envelope: Some(envelope),
            progress,
            fill: FillStyle::Solid(Color32::RED),
        };
        draw_progress_wave(&mut canvas, &mut ctx);
        canvas
    }

    #[test]
    fn played_share_uses_the_fill_style() {
        // block means 1, 0.5, 0, 0.25
        let envelope = summarize(&[1.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.25, 0.25], 4);
        assert_eq!(envelope.points(), &[1.0, 0.5, 0.0, 0.25]);
        let canvas = draw(&envelope, 0.5);

        let bars: Vec<_> = canvas
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, style, .. } => Some((*rect, style.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 4);

        let played = FillStyle::Solid(Color32::RED);
        let unplayed = FillStyle::Solid(unplayed_color());
        let styles: Vec<_> = bars.iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(styles, vec![played.clone(), played.clone(), played, unplayed]);

        let heights = [160.0, 80.0, 1.0, 40.0];
        for (i, (rect, _)) in bars.iter().enumerate() {
            assert!((rect.height() - heights[i]).abs() < 1e-3, "bar {i}: {rect:?}");
            assert!((rect.center().y - 100.0).abs() < 1e-3);
            assert!((rect.left() - i as f32 * 100.0).abs() < 1e-3);
            assert!((rect.width() - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn empty_envelope_draws_nothing() {
        let canvas = draw(&WaveformEnvelope::default(), 0.5);
        assert!(canvas.commands().is_empty());
    }
}
