use super::DrawContext;
use crate::canvas::Canvas;
use crate::color::with_alpha;
use crate::particles::bass_energy;

pub(super) fn draw_particles(canvas: &mut dyn Canvas, ctx: &mut DrawContext<'_>) {
    let size = canvas.dimensions();
    ctx.particles.set_cap(ctx.config.particle_cap);
    ctx.particles.tick(bass_energy(ctx.frame), size.x, size.y);
    for p in ctx.particles.particles() {
        canvas.fill_circle(p.pos, p.size, with_alpha(ctx.config.primary, p.alpha()));
    }
}
