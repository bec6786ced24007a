//! Cheap trigonometric stand-in for noise: three sines at incommensurate
//! frequencies. Smooth and fully deterministic, range `[-1, 1]`.

use glam::Vec2;

pub fn wave3(p: Vec2, t: f32, phase: f32) -> f32 {
    (p.x * 8.3 + t * 0.7 + phase).sin() * 0.4
        + (p.y * 6.7 + t * 0.5 + phase * 1.3).sin() * 0.35
        + ((p.x + p.y) * 5.1 + t * 0.3 + phase * 0.7).sin() * 0.25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_and_phase_sensitive() {
        let p = Vec2::new(0.3, 0.7);
        for i in 0..200 {
            let v = wave3(p, i as f32 * 0.1, 1.0);
            assert!(v.abs() <= 1.0);
        }
        assert_ne!(wave3(p, 0.0, 0.0), wave3(p, 0.0, 2.0));
    }
}
