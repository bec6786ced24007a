//! Drifting "synapse" nodes in normalized coordinates.
//!
//! Nodes are stepped on the host on both paths; the accelerated path uploads
//! them with the current connection list and splats them into a glow grid.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::input::InteractionState;
use crate::noise::wave::wave3;
use crate::simulation::types::{
    ACTIVATION_RADIUS, CONNECTION_DISTANCE, GpuConnection, GpuNode, MAX_CONNECTIONS, SYNAPSE_NODES,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SynapseParams {
    pub node_count: usize,
    pub steer: f32,
    pub centering: f32,
    /// Squared distance below which nodes repel.
    pub repel_range_sq: f32,
    pub repel_min_sq: f32,
    pub repel_strength: f32,
    pub damping: f32,
    pub edge_margin: f32,
    pub edge_push: f32,
    pub activation_radius: f32,
    pub activation_peak: f32,
    pub activation_decay: f32,
    pub propagation_gap: f32,
    pub propagation_rate: f32,
    pub connection_distance: f32,
    pub max_connections: usize,
}

impl Default for SynapseParams {
    fn default() -> Self {
        Self {
            node_count: SYNAPSE_NODES,
            steer: 0.00015,
            centering: 0.0006,
            repel_range_sq: 0.02,
            repel_min_sq: 0.0001,
            repel_strength: 0.000015,
            damping: 0.992,
            edge_margin: 0.08,
            edge_push: 0.001,
            activation_radius: ACTIVATION_RADIUS,
            activation_peak: 0.9,
            activation_decay: 0.965,
            propagation_gap: 0.02,
            propagation_rate: 0.2,
            connection_distance: CONNECTION_DISTANCE,
            max_connections: MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SynapseNode {
    pub position: Vec2,
    pub velocity: Vec2,
    /// In `[0, 1]`.
    pub activation: f32,
    /// Palette position in `[0, 1]`, cyan to purple.
    pub hue: f32,
    pub phase: f32,
}

/// Unordered pair of node indices, `a < b`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
}

impl Connection {
    /// `1` for touching nodes, `0` at `max_distance`.
    pub fn strength(&self, nodes: &[SynapseNode], max_distance: f32) -> f32 {
        let d = nodes[self.a].position.distance(nodes[self.b].position);
        (1.0 - d / max_distance).max(0.0)
    }

    pub fn mean_activation(&self, nodes: &[SynapseNode]) -> f32 {
        (nodes[self.a].activation + nodes[self.b].activation) * 0.5
    }
}

/// Every pair closer than `max_distance`, in `(i, j > i)` order, at most
/// `limit` of them.
pub fn connections(nodes: &[SynapseNode], max_distance: f32, limit: usize) -> Vec<Connection> {
    let max_sq = max_distance * max_distance;
    let mut out = Vec::new();

    'outer: for i in 0..nodes.len() {
        for j in i + 1..nodes.len() {
            if out.len() >= limit {
                break 'outer;
            }
            if nodes[i].position.distance_squared(nodes[j].position) < max_sq {
                out.push(Connection { a: i, b: j });
            }
        }
    }

    out
}

pub struct SynapseNetwork {
    nodes: Vec<SynapseNode>,
    connections: Vec<Connection>,
    params: SynapseParams,
}

impl SynapseNetwork {
    pub fn new(seed: u64) -> Self {
        Self::with_params(seed, SynapseParams::default())
    }

    pub fn with_params(seed: u64, params: SynapseParams) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = (0..params.node_count)
            .map(|_| SynapseNode {
                position: Vec2::new(0.1 + rng.r#gen::<f32>() * 0.8, 0.1 + rng.r#gen::<f32>() * 0.8),
                velocity: Vec2::new(rng.r#gen::<f32>() - 0.5, rng.r#gen::<f32>() - 0.5) * 0.001,
                activation: 0.0,
                hue: rng.r#gen(),
                phase: rng.r#gen::<f32>() * TAU,
            })
            .collect::<Vec<_>>();

        let connections = connections(&nodes, params.connection_distance, params.max_connections);
        Self {
            nodes,
            connections,
            params,
        }
    }

    pub fn nodes(&self) -> &[SynapseNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SynapseNode] {
        &mut self.nodes
    }

    /// Connections as of the last step.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn params(&self) -> &SynapseParams {
        &self.params
    }

    /// Advances the nodes to `time` (seconds) and rebuilds the connections.
    pub fn step(&mut self, time: f32, input: &InteractionState) {
        let pointer = input.is_active().then(|| input.position());
        let p = &self.params;

        for i in 0..self.nodes.len() {
            let mut node = self.nodes[i];

            let angle = wave3(node.position, time, node.phase) * PI;
            node.velocity += Vec2::from_angle(angle) * p.steer;
            node.velocity += (Vec2::splat(0.5) - node.position) * p.centering;

            for (j, other) in self.nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let offset = node.position - other.position;
                let d_sq = offset.length_squared();
                if d_sq < p.repel_range_sq && d_sq > p.repel_min_sq {
                    node.velocity += offset * (p.repel_strength / d_sq);
                }
            }

            node.velocity *= p.damping;
            node.position += node.velocity;

            if node.position.x < p.edge_margin {
                node.velocity.x += p.edge_push;
            }
            if node.position.x > 1.0 - p.edge_margin {
                node.velocity.x -= p.edge_push;
            }
            if node.position.y < p.edge_margin {
                node.velocity.y += p.edge_push;
            }
            if node.position.y > 1.0 - p.edge_margin {
                node.velocity.y -= p.edge_push;
            }

            if let Some(pointer) = pointer {
                let d = node.position.distance(pointer);
                if d < p.activation_radius {
                    let excited = (1.0 - d / p.activation_radius) * p.activation_peak;
                    node.activation = node.activation.max(excited);
                }
            }
            node.activation *= p.activation_decay;

            self.nodes[i] = node;
        }

        self.propagate();
        self.connections = connections(
            &self.nodes,
            self.params.connection_distance,
            self.params.max_connections,
        );
    }

    // Activation flows from the more active node of a close pair into the other.
    fn propagate(&mut self) {
        let p = &self.params;
        for i in 0..self.nodes.len() {
            for j in i + 1..self.nodes.len() {
                let dist = self.nodes[i].position.distance(self.nodes[j].position);
                if dist >= p.connection_distance {
                    continue;
                }
                let rate = (1.0 - dist / p.connection_distance) * p.propagation_rate;
                let (ai, aj) = (self.nodes[i].activation, self.nodes[j].activation);
                if ai > aj + p.propagation_gap {
                    self.nodes[j].activation += (ai - aj) * rate;
                } else if aj > ai + p.propagation_gap {
                    self.nodes[i].activation += (aj - ai) * rate;
                }
            }
        }
    }

    pub fn gpu_nodes(&self) -> Vec<GpuNode> {
        self.nodes
            .iter()
            .map(|n| GpuNode {
                position: n.position.to_array(),
                activation: n.activation,
                hue: n.hue,
            })
            .collect()
    }

    pub fn gpu_connections(&self) -> Vec<GpuConnection> {
        self.connections
            .iter()
            .map(|c| GpuConnection {
                nodes: [c.a as u32, c.b as u32],
                _padding: [0; 2],
            })
            .collect()
    }
}
