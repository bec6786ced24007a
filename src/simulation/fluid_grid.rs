//! Host execution of the fluid grid kernel.
//!
//! `cell_update` is the per-invocation body of `fluid_compute.wgsl`; the
//! software backend runs it over the whole grid with rayon, one row per task.

use glam::{Vec2, Vec4};
use rayon::prelude::*;

use crate::input::InteractionState;
use crate::noise::value::{curl, fbm, fract, hsv_to_rgb};
use crate::simulation::pingpong::PingPong;
use crate::simulation::trait_def::Simulation;
use crate::simulation::types::{DYE_MAX, FluidUniforms};
use crate::time::FrameTime;

const ADVECTION_SCALE: f32 = 12.0;
const VELOCITY_DECAY: f32 = 0.995;
const DYE_DECAY: f32 = 0.992;
const POINTER_RADIUS: f32 = 0.18;
const VORTEX_COUNT: usize = 12;
const VORTEX_RADIUS: f32 = 0.06;
const BURST_COUNT: usize = 3;
const BURST_RADIUS: f32 = 0.08;

/// One slot of the double-buffered grid, row-major.
#[derive(Debug, Clone)]
pub struct GridState {
    pub velocity: Vec<Vec2>,
    pub dye: Vec<Vec4>,
}

impl GridState {
    pub fn zeroed(size: usize) -> Self {
        Self {
            velocity: vec![Vec2::ZERO; size * size],
            dye: vec![Vec4::ZERO; size * size],
        }
    }
}

pub struct FluidGrid {
    size: usize,
    state: PingPong<GridState>,
    steps: u64,
}

impl FluidGrid {
    /// `size` must be a power of two.
    pub fn new(size: u32) -> Self {
        assert!(size.is_power_of_two(), "grid size must be a power of two");
        let size = size as usize;
        Self {
            size,
            state: PingPong::from_fn(|_| GridState::zeroed(size)),
            steps: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Latest velocity field.
    pub fn velocity(&self) -> &[Vec2] {
        &self.state.current().velocity
    }

    /// Latest dye field, `(r, g, b, density)`.
    pub fn dye(&self) -> &[Vec4] {
        &self.state.current().dye
    }

    pub fn velocity_at(&self, x: usize, y: usize) -> Vec2 {
        self.velocity()[y * self.size + x]
    }

    pub fn dye_at(&self, x: usize, y: usize) -> Vec4 {
        self.dye()[y * self.size + x]
    }

    /// Sum of the density channel.
    pub fn total_density(&self) -> f32 {
        self.dye().iter().map(|d| d.w).sum()
    }

    /// Runs the kernel over every cell, then flips the buffers.
    pub fn dispatch(&mut self, uniforms: &FluidUniforms) {
        let size = self.size;
        let (read, write) = self.state.split();

        write
            .velocity
            .par_chunks_mut(size)
            .zip(write.dye.par_chunks_mut(size))
            .enumerate()
            .for_each(|(y, (velocity_row, dye_row))| {
                for x in 0..size {
                    let (velocity, dye) = cell_update(x, y, size, read, uniforms);
                    velocity_row[x] = velocity;
                    dye_row[x] = dye;
                }
            });

        self.state.swap();
        self.steps += 1;
    }
}

impl Simulation for FluidGrid {
    fn name(&self) -> &str {
        "Fluid Grid"
    }

    fn step(&mut self, frame: &FrameTime, input: &InteractionState) {
        let uniforms = FluidUniforms::new(self.size as u32, frame, input);
        self.dispatch(&uniforms);
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}

fn nearest(pos: Vec2, size: usize) -> usize {
    let g = size as f32;
    let ix = (pos.x * g).clamp(0.0, g - 1.0) as usize;
    let iy = (pos.y * g).clamp(0.0, g - 1.0) as usize;
    iy * size + ix
}

fn splat_weight(d: f32, radius: f32) -> f32 {
    (-d * d / (radius * radius * 0.15)).exp()
}

fn palette(hue: f32) -> Vec4 {
    hsv_to_rgb(hue, 0.75, 1.0).extend(0.0)
}

/// New `(velocity, dye)` of cell `(x, y)` given the previous slot.
pub fn cell_update(
    x: usize,
    y: usize,
    size: usize,
    read: &GridState,
    u: &FluidUniforms,
) -> (Vec2, Vec4) {
    let t = u.time;
    let uv = (Vec2::new(x as f32, y as f32) + 0.5) / size as f32;
    let id = y * size + x;

    // 1. backward advection
    let back = (uv - read.velocity[id] * u.dt * ADVECTION_SCALE).clamp(Vec2::ZERO, Vec2::ONE);
    let source = nearest(back, size);
    let mut vel = read.velocity[source] * VELOCITY_DECAY;
    let mut dye = read.dye[source] * DYE_DECAY;

    // 2. turbulence
    vel += curl(uv * 6.0, t) * 45.0 * 0.012;

    // 3. procedural dye
    let n = fbm(uv * 4.0 + t * 0.15, t);
    if n > 0.55 {
        let hue = 0.5 + fract(t * 0.03 + uv.x * 0.4 + uv.y * 0.3) * 0.28;
        let amount = (n - 0.55) * 4.0 * 0.25;
        dye += palette(hue) * amount + Vec4::new(0.0, 0.0, 0.0, amount);
    }

    // 4. pointer
    if u.pointer_active > 0.5 {
        let d = uv.distance(u.pointer());
        if d < POINTER_RADIUS {
            let strength = splat_weight(d, POINTER_RADIUS);
            let delta = u.pointer_delta();
            let dir = (delta + Vec2::new(0.0001, 0.0)).normalize_or_zero();
            vel += dir * delta.length() * strength * 0.8;
            let hue = 0.5 + fract(t * 0.05) * 0.1;
            dye += palette(hue) * strength * 3.0 + Vec4::new(0.0, 0.0, 0.0, strength);
        }
    }

    // 5. orbiting vortices
    for j in 0..VORTEX_COUNT {
        let fj = j as f32;
        let angle = fj * 0.524 + t * (0.15 + fj * 0.035);
        let center = Vec2::splat(0.5) + Vec2::from_angle(angle) * (0.06 + fj * 0.05);
        let d = uv.distance(center);
        if d < VORTEX_RADIUS {
            let strength = splat_weight(d, VORTEX_RADIUS);
            vel += (uv - center).perp() * strength * 90.0;
            let hue = 0.5 + fract(fj / 12.0 + t * 0.05) * 0.28;
            dye += palette(hue) * strength * 1.5 + Vec4::new(0.0, 0.0, 0.0, strength);
        }
    }

    // 6. burst emitters, each active for part of its cycle
    for k in 0..BURST_COUNT {
        let fk = k as f32;
        if (t * 0.3 + fk * 2.094).sin() <= 0.7 {
            continue;
        }
        let center = Vec2::splat(0.5) + Vec2::from_angle(fk * 2.094 + t * 0.2) * 0.3;
        let d = uv.distance(center);
        if d < BURST_RADIUS {
            let strength = splat_weight(d, BURST_RADIUS);
            vel += Vec2::from_angle(t + fk) * strength * 60.0;
            let hue = 0.5 + fract(fk / 3.0 + t * 0.07) * 0.28;
            dye += palette(hue) * strength * 2.0 + Vec4::new(0.0, 0.0, 0.0, strength);
        }
    }

    (vel, dye.clamp(Vec4::ZERO, Vec4::splat(DYE_MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Viewport;

    fn frame(index: u64) -> FrameTime {
        FrameTime {
            dt: 1.0 / 60.0,
            elapsed: index as f32 / 60.0,
            frame_index: index,
        }
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two() {
        FluidGrid::new(100);
    }

    #[test]
    fn dye_stays_clamped() {
        let mut grid = FluidGrid::new(32);
        let viewport = Viewport::new(320, 320, 1.0);
        let mut input = InteractionState::new();

        for i in 0..120 {
            let angle = i as f32 * 0.2;
            input.pointer_moved(160.0 + angle.cos() * 80.0, 160.0 + angle.sin() * 80.0, &viewport);
            grid.step(&frame(i), &input);
            input.decay();
        }

        assert_eq!(grid.steps(), 120);
        for d in grid.dye() {
            assert!(d.cmpge(Vec4::ZERO).all() && d.cmple(Vec4::splat(DYE_MAX)).all(), "dye {d}");
        }
        assert!(grid.velocity().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn pointer_pushes_along_motion() {
        let size = 64;
        let cell = (16, 48);
        let uv = (Vec2::new(cell.0 as f32, cell.1 as f32) + 0.5) / size as f32;

        let mut uniforms = FluidUniforms {
            grid: size as f32,
            time: 0.0,
            dt: 1.0 / 60.0,
            pointer_active: 0.0,
            pointer: uv.to_array(),
            pointer_delta: [0.6, 0.0],
        };

        let mut control = FluidGrid::new(size);
        control.dispatch(&uniforms);

        uniforms.pointer_active = 1.0;
        let mut touched = FluidGrid::new(size);
        touched.dispatch(&uniforms);

        let gain = touched.velocity_at(cell.0, cell.1).x - control.velocity_at(cell.0, cell.1).x;
        assert!(gain > 0.4, "velocity gain {gain}");
        assert!(touched.dye_at(cell.0, cell.1).w > control.dye_at(cell.0, cell.1).w);
        assert!(touched.total_density() > control.total_density());
    }
}
