use glam::Vec2;

use super::NoiseField;

/// Seed used by the backdrop unless configured otherwise.
pub const DEFAULT_SEED: u32 = 42;

const GRADIENTS: [Vec2; 8] = [
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
];

/// Classic 2D gradient noise over a seeded permutation table.
///
/// The table is built once in `new` and never mutated, so a `PerlinNoise` can
/// be shared freely by reference.
#[derive(Clone)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    /// Folds the high half of a 64-bit seed into the low one first.
    pub fn from_seed(seed: u64) -> Self {
        Self::new((seed ^ (seed >> 32)) as u32)
    }

    pub fn new(seed: u32) -> Self {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates driven by the Park-Miller minimal standard generator.
        let mut state = u64::from(seed);
        for i in (1..256usize).rev() {
            state = state * 16_807 % 2_147_483_647;
            let j = (state % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        Self { perm }
    }

    /// Single-octave noise at `(x, y)`.
    pub fn noise2(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = (x0 as i32 & 255) as usize;
        let yi = (y0 as i32 & 255) as usize;
        let xf = x - x0;
        let yf = y - y0;

        let u = fade(xf);
        let v = fade(yf);

        let perm = &self.perm;
        let aa = perm[perm[xi] as usize + yi];
        let ab = perm[perm[xi] as usize + yi + 1];
        let ba = perm[perm[xi + 1] as usize + yi];
        let bb = perm[perm[xi + 1] as usize + yi + 1];

        let n00 = GRADIENTS[(aa & 7) as usize].dot(Vec2::new(xf, yf));
        let n10 = GRADIENTS[(ba & 7) as usize].dot(Vec2::new(xf - 1.0, yf));
        let n01 = GRADIENTS[(ab & 7) as usize].dot(Vec2::new(xf, yf - 1.0));
        let n11 = GRADIENTS[(bb & 7) as usize].dot(Vec2::new(xf - 1.0, yf - 1.0));

        lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
    }
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl NoiseField for PerlinNoise {
    fn sample(&self, p: Vec2) -> f32 {
        self.noise2(p.x, p.y)
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_shuffle() {
        let noise = PerlinNoise::new(7);
        let mut seen = [false; 256];
        for &v in &noise.perm[..256] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(noise.perm[..256], noise.perm[256..]);
    }

    #[test]
    fn same_seed_same_field() {
        let a = PerlinNoise::new(42);
        let b = PerlinNoise::new(42);
        let c = PerlinNoise::new(43);
        let p = Vec2::new(12.34, -5.67);
        assert_eq!(a.sample(p), b.sample(p));
        assert_ne!(a.perm, c.perm);
    }

    #[test]
    fn wide_seeds_keep_their_high_bits() {
        let low = PerlinNoise::from_seed(7);
        let high = PerlinNoise::from_seed(7 | (1 << 40));
        assert_ne!(low.perm, high.perm);
        assert_eq!(PerlinNoise::from_seed(7).perm, PerlinNoise::new(7).perm);
    }

    #[test]
    fn vanishes_on_lattice_points() {
        let noise = PerlinNoise::default();
        for (x, y) in [(0.0, 0.0), (3.0, 7.0), (-4.0, 2.0)] {
            assert_eq!(noise.noise2(x, y), 0.0);
        }
    }

    #[test]
    fn fractal_stays_in_range() {
        let noise = PerlinNoise::default();
        for i in 0..500 {
            let p = Vec2::new(i as f32 * 0.173, i as f32 * -0.311);
            let v = noise.fractal(p, 3);
            assert!((-1.0..=1.0).contains(&v), "{v} out of range at {p}");
        }
    }
}
