//! Accelerated backends and the one-shot capability negotiation that picks
//! between them and the canvas fallback.

pub mod host;
pub mod negotiate;
pub mod wgpu_backend;

use std::future::Future;

use glam::Vec4;
use thiserror::Error;

use crate::config::{EffectConfig, Variant};
use crate::input::InteractionState;
use crate::rendering::RenderError;
use crate::time::FrameTime;
use crate::viewport::Viewport;

pub use negotiate::{Negotiated, negotiate};

/// Why the accelerated path was not taken. Every variant leads to the
/// fallback; none is retried.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("no accelerated backend is present")]
    Unavailable,
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("adapter `{0}` lacks compute or fragment storage support")]
    NoCompute(String),
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("grid needs {needed} bytes per buffer, device allows {limit}")]
    GridTooLarge { needed: u64, limit: u64 },
    #[error("resource allocation failed: {0}")]
    Allocation(String),
    #[error("accelerated path disabled by configuration")]
    Disabled,
}

/// What an accelerated path is built for.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSetup {
    pub variant: Variant,
    pub grid_size: u32,
    pub viewport: Viewport,
    pub seed: u64,
    /// Resolution of the presentation stage relative to the viewport; the
    /// result is scaled up to fill the window.
    pub render_scale: f32,
}

impl PathSetup {
    pub fn from_config(config: &EffectConfig, viewport: Viewport) -> Self {
        Self {
            variant: config.variant,
            grid_size: config.grid_size,
            viewport,
            seed: config.seed,
            render_scale: config.render_scale.clamp(MIN_RENDER_SCALE, 1.0),
        }
    }
}

pub const MIN_RENDER_SCALE: f32 = 0.05;

/// Extremes and density of a color field, for diagnostics and tests.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldSummary {
    pub min: f32,
    pub max: f32,
    pub total_density: f32,
    pub all_finite: bool,
}

impl FieldSummary {
    pub fn of(cells: &[Vec4]) -> Self {
        let mut summary = Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            total_density: 0.0,
            all_finite: true,
        };
        for c in cells {
            summary.min = summary.min.min(c.min_element());
            summary.max = summary.max.max(c.max_element());
            summary.total_density += c.w;
            summary.all_finite &= c.is_finite();
        }
        summary
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PathStats {
    pub steps: u64,
    pub frames: u64,
    /// Present when the field lives in host memory.
    pub field: Option<FieldSummary>,
}

/// A running accelerated path: owns the grid and everything needed to show it.
pub trait AcceleratedPath {
    fn name(&self) -> &str;

    /// One simulation step.
    fn step(&mut self, frame: &FrameTime, input: &InteractionState);

    /// Presents the latest step.
    fn render(&mut self, frame: &FrameTime) -> Result<(), RenderError>;

    /// Output size changed; the grid keeps its resolution.
    fn resize(&mut self, viewport: Viewport);

    fn stats(&self) -> PathStats;
}

/// Staged acquisition of an accelerated device.
///
/// `negotiate` drives the stages in order and stops at the first error.
/// Whatever a failing stage allocated is dropped with its return value.
pub trait ComputeBackend {
    type Adapter;
    type Device;

    fn name(&self) -> &str;

    /// Cheap synchronous probe; `false` skips negotiation entirely.
    fn is_present(&self) -> bool;

    fn request_adapter(&mut self) -> impl Future<Output = Result<Self::Adapter, NegotiationError>>;

    fn request_device(
        &mut self,
        adapter: Self::Adapter,
    ) -> impl Future<Output = Result<Self::Device, NegotiationError>>;

    /// Builds the grid, pipelines and presentation target.
    fn allocate(
        &mut self,
        device: Self::Device,
        setup: &PathSetup,
    ) -> impl Future<Output = Result<Box<dyn AcceleratedPath>, NegotiationError>>;
}
