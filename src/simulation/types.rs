use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::input::InteractionState;
use crate::time::FrameTime;

// Constants for the grid simulation
pub const GRID_SIZE: u32 = 256;
pub const COMPUTE_WORKGROUP_SIZE: u32 = 8;
pub const DYE_MAX: f32 = 3.0;

// Synapse variant
pub const SYNAPSE_NODES: usize = 40;
pub const MAX_CONNECTIONS: usize = 200;
pub const CONNECTION_DISTANCE: f32 = 0.18;
pub const ACTIVATION_RADIUS: f32 = 0.12;
pub const SYNAPSE_DECAY: f32 = 0.88;

// Uniforms of the fluid compute kernel (binding 0)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FluidUniforms {
    pub grid: f32,
    pub time: f32,
    pub dt: f32,
    pub pointer_active: f32, // 1.0 while the pointer is inside the window
    pub pointer: [f32; 2],
    pub pointer_delta: [f32; 2],
}

impl FluidUniforms {
    pub fn new(grid: u32, frame: &FrameTime, input: &InteractionState) -> Self {
        Self {
            grid: grid as f32,
            time: frame.elapsed,
            dt: frame.dt,
            pointer_active: if input.is_active() { 1.0 } else { 0.0 },
            pointer: input.position().to_array(),
            pointer_delta: input.delta().to_array(),
        }
    }

    pub fn pointer(&self) -> Vec2 {
        Vec2::from_array(self.pointer)
    }

    pub fn pointer_delta(&self) -> Vec2 {
        Vec2::from_array(self.pointer_delta)
    }
}

// Uniforms of the synapse compute kernel (binding 0)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SynapseUniforms {
    pub grid: f32,
    pub time: f32,
    pub node_count: f32,
    pub connection_count: f32,
    pub connection_distance: f32,
    pub decay: f32,
    pub _padding: [f32; 2],
}

impl SynapseUniforms {
    pub fn new(grid: u32, time: f32, node_count: usize, connection_count: usize) -> Self {
        Self {
            grid: grid as f32,
            time,
            node_count: node_count as f32,
            connection_count: connection_count as f32,
            connection_distance: CONNECTION_DISTANCE,
            decay: SYNAPSE_DECAY,
            _padding: [0.0; 2],
        }
    }
}

// One synapse node as seen by the kernel: xy = position, z = activation, w = hue
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuNode {
    pub position: [f32; 2],
    pub activation: f32,
    pub hue: f32,
}

// Index pair of a live connection, padded to 16 bytes
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuConnection {
    pub nodes: [u32; 2],
    pub _padding: [u32; 2],
}

// Uniforms of the presentation stage; weights and strengths differ per variant
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    pub width: f32,
    pub height: f32,
    pub time: f32,
    pub grid: f32,
    pub center_weight: f32,
    pub edge_weight: f32,
    pub corner_weight: f32,
    pub gain: f32,
    pub aberration_px: f32,
    pub aberration_mix: f32,
    pub grain: f32,
    pub alpha_scale: f32,
    pub vignette_inner: f32,
    pub vignette_outer: f32,
    pub _padding: [f32; 2],
}
