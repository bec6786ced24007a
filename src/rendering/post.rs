//! Presentation stage on the host, the twin of `shaders/post.wgsl`.
//!
//! Turns a grid color field into premultiplied RGBA at output resolution:
//! blur, contrast, chromatic aberration, grain, vignette, luminance alpha.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use rayon::prelude::*;

use crate::config::Variant;
use crate::noise::value::grain_hash;
use crate::rendering::color::{over_background, pack_rgb};
use crate::simulation::types::PostUniforms;

/// Per-variant constants of the presentation stage.
pub fn post_uniforms(variant: Variant, grid: u32, width: u32, height: u32, time: f32) -> PostUniforms {
    let base = PostUniforms {
        width: width.max(1) as f32,
        height: height.max(1) as f32,
        time,
        grid: grid as f32,
        ..bytemuck::Zeroable::zeroed()
    };

    match variant {
        Variant::Fluid => PostUniforms {
            center_weight: 0.40,
            edge_weight: 0.10,
            corner_weight: 0.05,
            gain: 1.3,
            aberration_px: 1.5,
            aberration_mix: 0.15,
            grain: 0.06,
            alpha_scale: 0.35,
            vignette_inner: 0.1,
            vignette_outer: 0.85,
            ..base
        },
        Variant::Synapse => PostUniforms {
            center_weight: 0.36,
            edge_weight: 0.11,
            corner_weight: 0.05,
            gain: 1.2,
            aberration_px: 1.2,
            aberration_mix: 0.12,
            grain: 0.04,
            alpha_scale: 0.4,
            vignette_inner: 0.15,
            vignette_outer: 0.85,
            ..base
        },
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Gain, then `x²(3 - 2x)` on the clamped result.
pub fn s_curve(c: Vec3, gain: f32) -> Vec3 {
    let c = (c * gain).clamp(Vec3::ZERO, Vec3::ONE);
    c * c * (Vec3::splat(3.0) - 2.0 * c)
}

/// `1` inside `inner`, `0` beyond `outer`, distance measured from the center.
pub fn vignette(uv: Vec2, inner: f32, outer: f32) -> f32 {
    1.0 - smoothstep(inner, outer, uv.distance(Vec2::splat(0.5)))
}

fn texel(field: &[Vec4], grid: usize, x: i32, y: i32) -> Vec4 {
    let max = grid as i32 - 1;
    field[y.clamp(0, max) as usize * grid + x.clamp(0, max) as usize]
}

/// Bilinear lookup with clamp-to-edge, `uv` origin top-left.
pub fn sample_bilinear(field: &[Vec4], grid: usize, uv: Vec2) -> Vec4 {
    let p = uv * grid as f32 - 0.5;
    let i = p.floor();
    let f = p - i;
    let (x, y) = (i.x as i32, i.y as i32);

    let top = texel(field, grid, x, y).lerp(texel(field, grid, x + 1, y), f.x);
    let bottom = texel(field, grid, x, y + 1).lerp(texel(field, grid, x + 1, y + 1), f.x);
    top.lerp(bottom, f.y)
}

/// Premultiplied RGBA of the output pixel at `uv`.
pub fn shade(field: &[Vec4], grid: usize, uv: Vec2, u: &PostUniforms) -> Vec4 {
    let t = 1.0 / grid as f32;
    let at = |dx: f32, dy: f32| sample_bilinear(field, grid, uv + Vec2::new(dx, dy) * t).xyz();

    let mut c = at(0.0, 0.0) * u.center_weight;
    c += (at(1.0, 0.0) + at(-1.0, 0.0) + at(0.0, 1.0) + at(0.0, -1.0)) * u.edge_weight;
    c += (at(1.0, 1.0) + at(-1.0, 1.0) + at(1.0, -1.0) + at(-1.0, -1.0)) * u.corner_weight;

    c = s_curve(c, u.gain);

    let offset = Vec2::new(u.aberration_px / u.width, 0.0);
    let red = sample_bilinear(field, grid, uv + offset).x;
    let blue = sample_bilinear(field, grid, uv - offset).z;
    c.x += (red - c.x) * u.aberration_mix;
    c.z += (blue - c.z) * u.aberration_mix;

    let grain = grain_hash(uv * Vec2::new(u.width, u.height) + u.time * 100.0);
    c += (grain - 0.5) * u.grain;

    c *= vignette(uv, u.vignette_inner, u.vignette_outer);
    c = c.clamp(Vec3::ZERO, Vec3::ONE);

    let alpha = c.max_element() * u.alpha_scale;
    (c * alpha).extend(alpha)
}

/// Shades a `width × height` frame composited over the page background into
/// `0RGB` pixels.
pub fn render_into(field: &[Vec4], grid: usize, u: &PostUniforms, width: usize, out: &mut [u32]) {
    if width == 0 {
        return;
    }
    let height = out.len() / width;
    let size = Vec2::new(width as f32, height as f32);

    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            let uv = (Vec2::new(x as f32, y as f32) + 0.5) / size;
            *px = pack_rgb(over_background(shade(field, grid, uv, u)));
        }
    });
}
