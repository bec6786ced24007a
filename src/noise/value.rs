//! Hashed value noise, fractal sum and curl.
//!
//! These are the exact formulas of the WGSL grid kernels
//! (`rendering/shaders/*.wgsl`); the host grids call them so that a software
//! step produces the same field as a GPU step.

use glam::{Vec2, Vec3};

pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn fract2(p: Vec2) -> Vec2 {
    p - p.floor()
}

/// Pseudo-random value in `[0, 1)` for a 2D point.
pub fn hash21(p: Vec2) -> f32 {
    let mut q = fract2(p * Vec2::new(123.34, 456.21));
    q += q.dot(q + 45.32);
    fract(q.x * q.y)
}

/// Film-grain hash used by the presentation stage.
pub fn grain_hash(p: Vec2) -> f32 {
    let mut q = fract2(p * Vec2::new(443.897, 441.423));
    q += q.dot(q + 19.19);
    fract(q.x * q.y)
}

/// Hermite-smoothed value noise in `[0, 1]`.
pub fn noise2(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let a = hash21(i);
    let b = hash21(i + Vec2::new(1.0, 0.0));
    let c = hash21(i + Vec2::new(0.0, 1.0));
    let d = hash21(i + Vec2::new(1.0, 1.0));

    let top = a + (b - a) * u.x;
    let bottom = c + (d - c) * u.x;
    top + (bottom - top) * u.y
}

/// Four-octave fractal value noise drifting with time, range `[0, 0.9375]`.
pub fn fbm(p: Vec2, t: f32) -> f32 {
    let mut q = p;
    let mut amp = 0.5;
    let mut sum = 0.0;
    for _ in 0..4 {
        sum += amp * noise2(q + t * 0.3);
        q *= 2.01;
        amp *= 0.5;
    }
    sum
}

/// Perpendicular gradient of [`fbm`] by central differences.
pub fn curl(p: Vec2, t: f32) -> Vec2 {
    let e = 0.01;
    let dx = fbm(p + Vec2::new(e, 0.0), t) - fbm(p - Vec2::new(e, 0.0), t);
    let dy = fbm(p + Vec2::new(0.0, e), t) - fbm(p - Vec2::new(0.0, e), t);
    Vec2::new(dy, -dx) / (2.0 * e)
}

/// HSV to RGB with the hue wrapped into `[0, 1)`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let hh = fract(h) * 6.0;
    let i = hh as u32;
    let ff = hh - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * ff);
    let t = v * (1.0 - s * (1.0 - ff));
    match i {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}
