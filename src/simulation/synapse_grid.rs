//! Host execution of the synapse glow kernel (`synapse_compute.wgsl`).

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::input::InteractionState;
use crate::noise::value::hash21;
use crate::rendering::color::synapse_color;
use crate::simulation::pingpong::PingPong;
use crate::simulation::synapse::SynapseNetwork;
use crate::simulation::trait_def::Simulation;
use crate::simulation::types::{DYE_MAX, GpuConnection, GpuNode, SynapseUniforms};
use crate::time::FrameTime;

const LINE_WIDTH: f32 = 1.5;

pub struct SynapseGrid {
    size: usize,
    cells: PingPong<Vec<Vec4>>,
    steps: u64,
}

impl SynapseGrid {
    pub fn new(size: u32) -> Self {
        assert!(size.is_power_of_two(), "grid size must be a power of two");
        let size = size as usize;
        Self {
            size,
            cells: PingPong::from_fn(|_| vec![Vec4::ZERO; size * size]),
            steps: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Latest glow field, `(r, g, b, a)`.
    pub fn cells(&self) -> &[Vec4] {
        self.cells.current()
    }

    pub fn cell(&self, x: usize, y: usize) -> Vec4 {
        self.cells()[y * self.size + x]
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn dispatch(
        &mut self,
        uniforms: &SynapseUniforms,
        nodes: &[GpuNode],
        connections: &[GpuConnection],
    ) {
        let size = self.size;
        let (read, write) = self.cells.split();

        write
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    *out = cell_update(x, y, size, read, nodes, connections, uniforms);
                }
            });

        self.cells.swap();
        self.steps += 1;
    }
}

fn dist_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 < 0.001 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// New glow value of cell `(x, y)`; node positions are scaled to grid cells.
pub fn cell_update(
    x: usize,
    y: usize,
    size: usize,
    prev: &[Vec4],
    nodes: &[GpuNode],
    connections: &[GpuConnection],
    u: &SynapseUniforms,
) -> Vec4 {
    let pos = Vec2::new(x as f32, y as f32);
    let res = size as f32;
    let decayed = prev[y * size + x] * u.decay;

    let mut color = Vec3::ZERO;
    let mut alpha = 0.0;

    let node_count = (u.node_count as usize).min(nodes.len());
    let live = &nodes[..node_count];

    let connection_count = (u.connection_count as usize).min(connections.len());
    for pair in &connections[..connection_count] {
        let (Some(na), Some(nb)) = (
            live.get(pair.nodes[0] as usize),
            live.get(pair.nodes[1] as usize),
        ) else {
            continue;
        };
        let a = Vec2::from_array(na.position);
        let b = Vec2::from_array(nb.position);
        let pa = a * res;
        let pb = b * res;

        if pos.distance(pa).min(pos.distance(pb)) > pa.distance(pb) + 10.0 {
            continue;
        }

        let d = dist_to_segment(pos, pa, pb);
        if d >= LINE_WIDTH * 6.0 {
            continue;
        }

        let strength = (1.0 - a.distance(b) / u.connection_distance).max(0.0);
        let mean_activation = (na.activation + nb.activation) * 0.5;
        let glow = (-d * d / (LINE_WIDTH * LINE_WIDTH * 2.0)).exp();
        let brightness = strength * (0.1 + mean_activation * 0.9);
        let hue = (na.hue + nb.hue) * 0.5;

        // pulse travelling from a to b
        let seg = pb - pa;
        let along = ((pos - pa).dot(seg) / seg.dot(seg).max(0.001)).clamp(0.0, 1.0);
        let pulse = (along * 12.566 - u.time * 4.0 + hash21(a) * 6.283).sin() * 0.5 + 0.5;
        let pulse_strength = mean_activation * pulse * 0.3;

        color += synapse_color(hue) * glow * (brightness + pulse_strength);
        alpha += glow * (brightness + pulse_strength) * 0.4;
    }

    for (i, node) in live.iter().enumerate() {
        let d = pos.distance(Vec2::from_array(node.position) * res);

        let core_radius = 4.0 + node.activation * 6.0;
        let core = (-d * d / (core_radius * core_radius)).exp();
        let halo_radius = core_radius * 7.0;
        let halo = (-d * d / (halo_radius * halo_radius)).exp() * 0.25;

        let brightness = 0.2 + node.activation * 2.2;
        let pulse = (u.time * 1.5 + node.hue * 6.283 + i as f32 * 0.5).sin() * 0.1 + 1.0;

        color += synapse_color(node.hue) * (core + halo) * brightness * pulse;
        alpha += (core * 0.6 + halo * 0.1) * brightness;
    }

    color
        .extend(alpha)
        .max(decayed)
        .clamp(Vec4::ZERO, Vec4::splat(DYE_MAX))
}

/// Node network plus the glow grid it is splatted into.
pub struct SynapseField {
    network: SynapseNetwork,
    grid: SynapseGrid,
}

impl SynapseField {
    pub fn new(grid_size: u32, seed: u64) -> Self {
        Self {
            network: SynapseNetwork::new(seed),
            grid: SynapseGrid::new(grid_size),
        }
    }

    pub fn network(&self) -> &SynapseNetwork {
        &self.network
    }

    pub fn grid(&self) -> &SynapseGrid {
        &self.grid
    }
}

impl Simulation for SynapseField {
    fn name(&self) -> &str {
        "Synapse Field"
    }

    fn step(&mut self, frame: &FrameTime, input: &InteractionState) {
        self.network.step(frame.elapsed, input);
        let nodes = self.network.gpu_nodes();
        let connections = self.network.gpu_connections();
        let uniforms = SynapseUniforms::new(
            self.grid.size() as u32,
            frame.elapsed,
            nodes.len(),
            connections.len(),
        );
        self.grid.dispatch(&uniforms, &nodes, &connections);
    }

    fn steps(&self) -> u64 {
        self.grid.steps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: f32, y: f32, activation: f32) -> GpuNode {
        GpuNode {
            position: [x, y],
            activation,
            hue: 0.0,
        }
    }

    #[test]
    fn glow_decays_when_nodes_vanish() {
        let mut grid = SynapseGrid::new(32);
        let nodes = [node(0.5, 0.5, 1.0)];
        grid.dispatch(&SynapseUniforms::new(32, 0.0, 1, 0), &nodes, &[]);
        let lit = grid.cell(16, 16);
        assert!(lit.w > 0.5, "core alpha {}", lit.w);

        grid.dispatch(&SynapseUniforms::new(32, 0.1, 0, 0), &nodes, &[]);
        let faded = grid.cell(16, 16);
        assert!((faded.w - (lit.w * 0.88).min(DYE_MAX)).abs() < 1e-4);
    }

    #[test]
    fn connection_draws_a_line() {
        let nodes = [node(0.25, 0.5, 0.8), node(0.4, 0.5, 0.8)];
        let link = [GpuConnection {
            nodes: [0, 1],
            _padding: [0; 2],
        }];

        let mut linked = SynapseGrid::new(64);
        linked.dispatch(&SynapseUniforms::new(64, 0.0, 2, 1), &nodes, &link);
        let mut unlinked = SynapseGrid::new(64);
        unlinked.dispatch(&SynapseUniforms::new(64, 0.0, 2, 0), &nodes, &link);

        // on the segment the line adds to the halos; far off it nothing changes
        assert!(linked.cell(21, 32).w > unlinked.cell(21, 32).w);
        assert_eq!(linked.cell(21, 50), unlinked.cell(21, 50));
    }

    #[test]
    fn field_stays_bounded() {
        let mut field = SynapseField::new(32, 3);
        let input = InteractionState::new();
        for i in 0..200 {
            let frame = FrameTime {
                dt: 1.0 / 60.0,
                elapsed: i as f32 / 60.0,
                frame_index: i,
            };
            field.step(&frame, &input);
        }
        assert_eq!(field.steps(), 200);
        for c in field.grid().cells() {
            assert!(c.is_finite() && c.cmple(Vec4::splat(DYE_MAX)).all() && c.cmpge(Vec4::ZERO).all());
        }
    }
}
