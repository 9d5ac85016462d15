//! Adrenaline particle burst
//!
//! Purely cosmetic. The engine only triggers a burst; renderers read the
//! particles back.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const BURST_SIZE: usize = 20;
const VELOCITY_DAMPING: f64 = 0.9;

/// One spark of a burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub size: f64,
    /// Seconds left; the particle is removed at zero
    pub life: f64,
    pub max_life: f64,
}

impl Particle {
    /// Opacity in [0, 1]
    pub fn alpha(&self) -> f64 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Live particles with a seeded generator, so a replay draws the same sparks every run
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: Pcg32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Replace any live sparks with a fresh ring at `origin`
    pub fn burst(&mut self, origin: DVec2) {
        self.particles.clear();
        for _ in 0..BURST_SIZE {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(50.0..200.0);
            self.particles.push(Particle {
                position: origin,
                velocity: DVec2::from_angle(angle) * speed,
                size: self.rng.random_range(3.0..10.0),
                life: 1.0,
                max_life: self.rng.random_range(0.3..0.8),
            });
        }
    }

    pub fn update(&mut self, dt: f64) {
        for particle in &mut self.particles {
            particle.position += particle.velocity * dt;
            particle.velocity *= VELOCITY_DAMPING;
            particle.life -= dt;
        }
        self.particles.retain(|particle| particle.life > 0.0);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
