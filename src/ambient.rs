//! Always-on background motion: nebula spin, decorative ring drift and the
//! floating particle field around the nebula.
//!
//! Rates are per second so motion does not depend on the display's refresh
//! rate.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::scene::{Category, SceneObject};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientMotion {
    /// Nebula rotation about z, radians per second.
    pub nebula_spin: f32,
    /// Ring rotation about z, radians per second.
    pub ring_spin: f32,
    /// Multiplier from clock time to the nebula shader's time uniform.
    pub effect_flow: f32,
}

impl Default for AmbientMotion {
    fn default() -> Self {
        Self { nebula_spin: 0.018, ring_spin: 0.006, effect_flow: 0.15 }
    }
}

impl AmbientMotion {
    pub fn advance(&self, delta: f32, objects: &mut [SceneObject]) {
        for object in objects.iter_mut() {
            match object.category() {
                Category::Background => object.rotation.z += self.nebula_spin * delta,
                Category::Ring => object.rotation.z += self.ring_spin * delta,
                _ => {}
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleBand {
    pub count: usize,
    pub radius: (f32, f32),
    /// Radians per second.
    pub speed: (f32, f32),
    pub size: (f32, f32),
    /// Horizontal stretch of the band's ellipse.
    pub stretch: f32,
    /// Depth jitter around z = 0.
    pub depth: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleFieldConfig {
    pub bands: Vec<ParticleBand>,
    /// Id of the object whose opacity the field follows.
    pub follows: String,
}

impl ParticleFieldConfig {
    pub fn nebula() -> Self {
        Self {
            bands: vec![
                ParticleBand {
                    count: 200,
                    radius: (1.5, 5.0),
                    speed: (0.006, 0.024),
                    size: (0.03, 0.09),
                    stretch: 1.3,
                    depth: 0.5,
                },
                ParticleBand {
                    count: 80,
                    radius: (0.3, 1.5),
                    speed: (0.03, 0.09),
                    size: (0.05, 0.05),
                    stretch: 1.0,
                    depth: 0.3,
                },
            ],
            follows: "nebula".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub angle: f32,
    pub radius: f32,
    pub speed: f32,
    pub float_offset: f32,
    pub stretch: f32,
    pub size: f32,
    pub position: Vec3,
}

/// Free-floating points drifting around the nebula. Not individually
/// addressable, so they live outside the scene registry.
#[derive(Clone, Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    follows: String,
}

impl ParticleField {
    pub fn new(config: &ParticleFieldConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x5eed_f1e1d);
        let mut particles = Vec::new();
        for band in &config.bands {
            for _ in 0..band.count {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let radius = rng.gen_range(band.radius.0..=band.radius.1);
                let z = (rng.gen::<f32>() - 0.5) * band.depth;
                particles.push(Particle {
                    angle,
                    radius,
                    speed: rng.gen_range(band.speed.0..=band.speed.1),
                    float_offset: rng.gen_range(0.0..std::f32::consts::TAU),
                    stretch: band.stretch,
                    size: rng.gen_range(band.size.0..=band.size.1),
                    position: Vec3::new(
                        angle.cos() * radius * band.stretch,
                        angle.sin() * radius,
                        z,
                    ),
                });
            }
        }
        Self { particles, follows: config.follows.clone() }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn follows(&self) -> &str {
        &self.follows
    }

    /// Revolve every particle and apply the gentle float at clock `time`.
    pub fn advance(&mut self, delta: f32, time: f32) {
        for particle in &mut self.particles {
            particle.angle += particle.speed * delta;
            let float_x = (time * 1.5 + particle.float_offset).cos() * 0.01;
            let float_y = (time * 2.0 + particle.float_offset).sin() * 0.02;
            let (sin, cos) = particle.angle.sin_cos();
            particle.position.x = cos * particle.radius * particle.stretch + float_x;
            particle.position.y = sin * particle.radius + float_y;
        }
    }
}
