//! Flow-field particles for the software canvas path.
//!
//! Each particle follows the angle of a fractal noise field, optionally bent
//! into a swirl around the pointer. Dead or escaped particles are respawned in
//! their slot, so the population never changes after construction.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::input::InteractionState;
use crate::noise::{NoiseField, PerlinNoise};
use crate::simulation::trait_def::Simulation;
use crate::time::FrameTime;
use crate::viewport::Viewport;

/// Cyan and purple hues, in degrees.
pub const PALETTE_HUES: [f32; 8] = [180.0, 185.0, 190.0, 195.0, 200.0, 260.0, 270.0, 280.0];

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleParams {
    pub max_particles: usize,
    /// Logical pixels of viewport area per particle.
    pub area_per_particle: f32,
    pub flow_scale: f32,
    pub flow_drift: Vec2,
    pub octaves: u32,
    pub angle_gain: f32,
    /// Global time advanced per frame.
    pub time_step: f32,
    pub influence_radius: f32,
    pub curl_blend: f32,
    pub push: f32,
    /// Distance outside the viewport before a particle is respawned.
    pub margin: f32,
    pub fade_in: f32,
    pub fade_out: f32,
    pub max_alpha: f32,
    pub burst_probability: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_life: u32,
    pub max_life: u32,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            max_particles: 600,
            area_per_particle: 2500.0,
            flow_scale: 0.002,
            flow_drift: Vec2::new(0.3, 0.2),
            octaves: 3,
            angle_gain: PI * 2.5,
            time_step: 0.006,
            influence_radius: 200.0,
            curl_blend: 0.6,
            push: 0.02,
            margin: 30.0,
            fade_in: 0.08,
            fade_out: 0.15,
            max_alpha: 0.55,
            burst_probability: 0.015,
            min_speed: 0.4,
            max_speed: 2.0,
            min_life: 100,
            max_life: 600,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    /// Logical pixels.
    pub position: Vec2,
    pub speed: f32,
    pub life: u32,
    pub max_life: u32,
    /// Degrees, one of [`PALETTE_HUES`].
    pub hue: f32,
}

impl Particle {
    pub fn life_ratio(&self) -> f32 {
        if self.max_life == 0 {
            1.0
        } else {
            self.life as f32 / self.max_life as f32
        }
    }

    /// Fade-in / fade-out envelope scaled to `max_alpha`.
    pub fn alpha(&self, params: &ParticleParams) -> f32 {
        let ratio = self.life_ratio();
        let envelope = if ratio < params.fade_in {
            ratio / params.fade_in
        } else if ratio > 1.0 - params.fade_out {
            (1.0 - ratio) / params.fade_out
        } else {
            1.0
        };
        envelope.clamp(0.0, 1.0) * params.max_alpha
    }

    pub fn saturation(&self) -> f32 {
        0.75 + (self.life as f32 * 0.02).sin() * 0.20
    }

    pub fn lightness(&self) -> f32 {
        0.55 + (self.life as f32 * 0.03).sin() * 0.15
    }
}

/// A decorative radial glow drawn for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlowBurst {
    pub center: Vec2,
    pub hue: f32,
}

pub struct ParticleSystem<N: NoiseField = PerlinNoise> {
    particles: Vec<Particle>,
    noise: N,
    rng: StdRng,
    params: ParticleParams,
    viewport: Viewport,
    time: f32,
    steps: u64,
    burst: Option<GlowBurst>,
}

impl ParticleSystem<PerlinNoise> {
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        Self::with_noise(
            PerlinNoise::from_seed(seed),
            viewport,
            seed,
            ParticleParams::default(),
        )
    }
}

impl<N: NoiseField> ParticleSystem<N> {
    pub fn with_noise(noise: N, viewport: Viewport, seed: u64, params: ParticleParams) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let bounds = viewport.logical_size();
        let count = population_for(bounds, &params);

        let particles = (0..count)
            .map(|_| {
                let mut p = spawn(&mut rng, bounds, &params);
                // Stagger ages so the first frames don't pulse in unison.
                p.life = rng.gen_range(0..p.max_life);
                p
            })
            .collect();

        Self {
            particles,
            noise,
            rng,
            params,
            viewport,
            time: 0.0,
            steps: 0,
            burst: None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the particles; the slice length is fixed.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn params(&self) -> &ParticleParams {
        &self.params
    }

    /// The glow burst rolled during the last step, if any.
    pub fn burst(&self) -> Option<GlowBurst> {
        self.burst
    }

    /// Tracks the viewport. The population is not resized; particles that end
    /// up outside are respawned on their next step.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Flow direction at `position`, in radians.
    pub fn flow_angle(&self, position: Vec2) -> f32 {
        let p = position * self.params.flow_scale + self.params.flow_drift * self.time;
        self.noise.fractal(p, self.params.octaves) * self.params.angle_gain
    }

    /// Advances every particle by one frame.
    pub fn advance(&mut self, input: &InteractionState) {
        self.time += self.params.time_step;
        self.steps += 1;

        let bounds = self.viewport.logical_size();
        let pointer = input
            .is_active()
            .then(|| input.logical_position(&self.viewport));
        let radius = self.params.influence_radius;

        for i in 0..self.particles.len() {
            let mut p = self.particles[i];
            p.life += 1;

            if p.life > p.max_life || outside(p.position, bounds, self.params.margin) {
                self.particles[i] = spawn(&mut self.rng, bounds, &self.params);
                continue;
            }

            let mut angle = self.flow_angle(p.position);

            if let Some(pointer) = pointer {
                let offset = p.position - pointer;
                let dist_sq = offset.length_squared();
                if dist_sq < radius * radius {
                    let influence = 1.0 - dist_sq.sqrt() / radius;
                    let curl_angle = offset.y.atan2(offset.x) + FRAC_PI_2;
                    angle += (curl_angle - angle) * influence * self.params.curl_blend;
                    p.position += offset * influence * self.params.push;
                }
            }

            p.position += Vec2::new(angle.cos(), angle.sin()) * p.speed;
            self.particles[i] = p;
        }

        self.burst = if self.rng.r#gen::<f32>() < self.params.burst_probability {
            Some(GlowBurst {
                center: Vec2::new(
                    self.rng.gen_range(0.0..bounds.x.max(1.0)),
                    self.rng.gen_range(0.0..bounds.y.max(1.0)),
                ),
                hue: PALETTE_HUES[self.rng.gen_range(0..PALETTE_HUES.len())],
            })
        } else {
            None
        };
    }
}

impl<N: NoiseField> Simulation for ParticleSystem<N> {
    fn name(&self) -> &str {
        "Flow Particles"
    }

    fn step(&mut self, _frame: &FrameTime, input: &InteractionState) {
        self.advance(input);
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}

fn population_for(bounds: Vec2, params: &ParticleParams) -> usize {
    let by_area = (bounds.x * bounds.y / params.area_per_particle).floor() as usize;
    by_area.clamp(1, params.max_particles.max(1))
}

fn outside(position: Vec2, bounds: Vec2, margin: f32) -> bool {
    position.x < -margin
        || position.y < -margin
        || position.x > bounds.x + margin
        || position.y > bounds.y + margin
}

// Spawn points are uniform over the viewport, independent of the flow field.
fn spawn(rng: &mut StdRng, bounds: Vec2, params: &ParticleParams) -> Particle {
    Particle {
        position: Vec2::new(
            rng.gen_range(0.0..bounds.x.max(1.0)),
            rng.gen_range(0.0..bounds.y.max(1.0)),
        ),
        speed: rng.gen_range(params.min_speed..params.max_speed),
        life: 0,
        max_life: rng.gen_range(params.min_life..params.max_life),
        hue: PALETTE_HUES[rng.gen_range(0..PALETTE_HUES.len())],
    }
}
