//! Deterministic noise fields shared by both simulation paths.

mod perlin;
pub mod value;
pub mod wave;

pub use perlin::{DEFAULT_SEED, PerlinNoise};

use glam::Vec2;

/// A deterministic scalar field over the plane, roughly in `[-1, 1]`.
pub trait NoiseField {
    fn sample(&self, p: Vec2) -> f32;

    /// Sum of `octaves` samples at doubling frequency and halving amplitude,
    /// normalized by the total amplitude.
    fn fractal(&self, p: Vec2, octaves: u32) -> f32 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;

        for _ in 0..octaves.max(1) {
            value += self.sample(p * frequency) * amplitude;
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        value / total
    }
}
