use emath::{pos2, Pos2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DEFAULT_PARTICLE_CAP;

/// Bass energy above which a burst is spawned.
pub const SPAWN_THRESHOLD: f32 = 140.0;
pub const BURST_SIZE: usize = 5;
pub const PARTICLE_LIFE: f32 = 100.0;
const SHRINK: f32 = 0.98;
const MIN_SIZE: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: Pos2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self) {
        self.pos += self.vel;
        self.life -= 1.0;
        self.size *= SHRINK;
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0 && self.size >= MIN_SIZE
    }

    /// Draw opacity, fading out over the particle's life.
    pub fn alpha(&self) -> f32 {
        (self.life / PARTICLE_LIFE).clamp(0.0, 1.0)
    }
}

/// Mean byte value over the lowest quarter of an analysis frame.
pub fn bass_energy(frame: &[u8]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let n = (frame.len() / 4).max(1);
    frame[..n].iter().map(|&b| f32::from(b)).sum::<f32>() / n as f32
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    cap: usize,
    rng: StdRng,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("live", &self.particles.len())
            .field("cap", &self.cap)
            .finish_non_exhaustive()
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            cap: DEFAULT_PARTICLE_CAP,
            rng,
        }
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Advance one frame: age and cull what exists, then maybe emit a burst
    /// at the surface center.
    pub fn tick(&mut self, bass_energy: f32, width: f32, height: f32) {
        for p in &mut self.particles {
            p.update();
        }
        self.particles.retain(Particle::is_alive);

        if bass_energy > SPAWN_THRESHOLD {
            self.spawn_burst(pos2(width / 2.0, height / 2.0));
        }
    }

    fn spawn_burst(&mut self, center: Pos2) {
        let room = self.cap.saturating_sub(self.particles.len());
        for _ in 0..BURST_SIZE.min(room) {
            let vel = Vec2::new(
                self.rng.random_range(-2.0..=2.0),
                self.rng.random_range(-2.0..=2.0),
            );
            let size = self.rng.random_range(2.0..=7.0);
            self.particles.push(Particle {
                pos: center,
                vel,
                life: PARTICLE_LIFE,
                size,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bass_energy_uses_lowest_quarter() {
        let mut frame = vec![0u8; 16];
        frame[..4].fill(200);
        assert_eq!(bass_energy(&frame), 200.0);
        assert_eq!(bass_energy(&[90, 0, 0]), 90.0);
        assert_eq!(bass_energy(&[]), 0.0);
    }

    #[test]
    fn loud_bass_spawns_a_burst_at_center() {
        let mut sys = ParticleSystem::with_seed(7);
        sys.tick(141.0, 200.0, 100.0);
        assert_eq!(sys.len(), BURST_SIZE);
        for p in sys.particles() {
            assert_eq!(p.pos, pos2(100.0, 50.0));
            assert!(p.vel.x.abs() <= 2.0 && p.vel.y.abs() <= 2.0);
            assert!((2.0..=7.0).contains(&p.size));
            assert_eq!(p.life, PARTICLE_LIFE);
        }
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut sys = ParticleSystem::with_seed(1);
        sys.tick(SPAWN_THRESHOLD, 10.0, 10.0);
        assert!(sys.is_empty());
    }

    #[test]
    fn particle_dies_after_exactly_its_life() {
        let mut sys = ParticleSystem::with_seed(3);
        sys.tick(255.0, 100.0, 100.0);
        // Keep a single, large particle so shrinking can't cull it first.
        sys.particles.truncate(1);
        sys.particles[0].size = 1000.0;
        for _ in 0..99 {
            sys.tick(0.0, 100.0, 100.0);
        }
        assert_eq!(sys.len(), 1);
        assert!((sys.particles()[0].alpha() - 0.01).abs() < 1e-6);
        sys.tick(0.0, 100.0, 100.0);
        assert!(sys.is_empty());
    }

    #[test]
    fn small_particles_shrink_away() {
        let mut sys = ParticleSystem::with_seed(3);
        sys.tick(255.0, 100.0, 100.0);
        // 7 * 0.98^n < 0.5 once n >= 131, so every particle is gone long before then
        for _ in 0..131 {
            sys.tick(0.0, 100.0, 100.0);
        }
        assert!(sys.is_empty());
    }

    #[test]
    fn cap_bounds_live_count() {
        let mut sys = ParticleSystem::with_seed(11);
        sys.set_cap(12);
        for _ in 0..10 {
            sys.tick(255.0, 100.0, 100.0);
        }
        assert_eq!(sys.len(), 12);
    }

    #[test]
    fn same_seed_same_particles() {
        let mut a = ParticleSystem::with_seed(42);
        let mut b = ParticleSystem::with_seed(42);
        a.tick(200.0, 50.0, 50.0);
        b.tick(200.0, 50.0, 50.0);
        assert_eq!(a.particles(), b.particles());
    }
}
