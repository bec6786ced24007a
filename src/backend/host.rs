//! Software compute backend: the grid kernels run on the CPU (rayon rows) and
//! the post stage renders into a frame buffer handed to a [`PixelSink`].

use glam::Vec4;

use super::{
    AcceleratedPath, ComputeBackend, FieldSummary, MIN_RENDER_SCALE, NegotiationError, PathSetup,
    PathStats,
};
use crate::config::{MAX_GRID_SIZE, Variant};
use crate::input::InteractionState;
use crate::rendering::RenderError;
use crate::rendering::post::{post_uniforms, render_into};
use crate::rendering::presenter::PixelSink;
use crate::simulation::trait_def::Simulation;
use crate::simulation::{FluidGrid, SynapseField};
use crate::time::FrameTime;
use crate::viewport::Viewport;

pub struct HostAdapter {
    pub threads: usize,
}

pub struct HostDevice {
    pub threads: usize,
}

pub struct HostBackend {
    sink: Option<Box<dyn PixelSink>>,
}

impl HostBackend {
    pub fn new(sink: Box<dyn PixelSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Frames are rendered but not shown anywhere.
    pub fn headless() -> Self {
        Self { sink: None }
    }
}

impl ComputeBackend for HostBackend {
    type Adapter = HostAdapter;
    type Device = HostDevice;

    fn name(&self) -> &str {
        "host"
    }

    fn is_present(&self) -> bool {
        true
    }

    async fn request_adapter(&mut self) -> Result<HostAdapter, NegotiationError> {
        Ok(HostAdapter {
            threads: rayon::current_num_threads(),
        })
    }

    async fn request_device(&mut self, adapter: HostAdapter) -> Result<HostDevice, NegotiationError> {
        log::debug!("host device with {} threads", adapter.threads);
        Ok(HostDevice {
            threads: adapter.threads,
        })
    }

    async fn allocate(
        &mut self,
        _device: HostDevice,
        setup: &PathSetup,
    ) -> Result<Box<dyn AcceleratedPath>, NegotiationError> {
        if !setup.grid_size.is_power_of_two() || setup.grid_size > MAX_GRID_SIZE {
            return Err(NegotiationError::Allocation(format!(
                "grid size {} is not a power of two up to {MAX_GRID_SIZE}",
                setup.grid_size
            )));
        }
        Ok(Box::new(HostPath::new(setup, self.sink.take())))
    }
}

enum HostScene {
    Fluid(FluidGrid),
    Synapse(SynapseField),
}

impl HostScene {
    fn simulation_mut(&mut self) -> &mut dyn Simulation {
        match self {
            HostScene::Fluid(grid) => grid,
            HostScene::Synapse(field) => field,
        }
    }

    fn simulation(&self) -> &dyn Simulation {
        match self {
            HostScene::Fluid(grid) => grid,
            HostScene::Synapse(field) => field,
        }
    }

    fn field(&self) -> &[Vec4] {
        match self {
            HostScene::Fluid(grid) => grid.dye(),
            HostScene::Synapse(field) => field.grid().cells(),
        }
    }
}

/// The accelerated path with every stage on the host.
pub struct HostPath {
    scene: HostScene,
    variant: Variant,
    grid_size: u32,
    render_scale: f32,
    output: (usize, usize),
    frame_buffer: Vec<u32>,
    sink: Option<Box<dyn PixelSink>>,
    frames: u64,
}

fn output_size(viewport: Viewport, scale: f32) -> (usize, usize) {
    let (w, h) = viewport.scaled(scale);
    (w as usize, h as usize)
}

impl HostPath {
    pub fn new(setup: &PathSetup, sink: Option<Box<dyn PixelSink>>) -> Self {
        let scene = match setup.variant {
            Variant::Fluid => HostScene::Fluid(FluidGrid::new(setup.grid_size)),
            Variant::Synapse => HostScene::Synapse(SynapseField::new(setup.grid_size, setup.seed)),
        };
        let render_scale = setup.render_scale.clamp(MIN_RENDER_SCALE, 1.0);
        let output = output_size(setup.viewport, render_scale);

        Self {
            scene,
            variant: setup.variant,
            grid_size: setup.grid_size,
            render_scale,
            output,
            frame_buffer: vec![0; output.0 * output.1],
            sink,
            frames: 0,
        }
    }

    /// Latest color field, `grid × grid` cells.
    pub fn field(&self) -> &[Vec4] {
        self.scene.field()
    }

    /// Last rendered frame as `0RGB`, see [`HostPath::output_size`].
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    pub fn output_size(&self) -> (usize, usize) {
        self.output
    }
}

impl AcceleratedPath for HostPath {
    fn name(&self) -> &str {
        self.scene.simulation().name()
    }

    fn step(&mut self, frame: &FrameTime, input: &InteractionState) {
        self.scene.simulation_mut().step(frame, input);
    }

    fn render(&mut self, frame: &FrameTime) -> Result<(), RenderError> {
        let (width, height) = self.output;
        let uniforms = post_uniforms(
            self.variant,
            self.grid_size,
            width as u32,
            height as u32,
            frame.elapsed,
        );
        render_into(
            self.scene.field(),
            self.grid_size as usize,
            &uniforms,
            width,
            &mut self.frame_buffer,
        );

        if let Some(sink) = self.sink.as_mut() {
            sink.present(width, height, &self.frame_buffer)?;
        }
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.output = output_size(viewport, self.render_scale);
        self.frame_buffer.resize(self.output.0 * self.output.1, 0);
    }

    fn stats(&self) -> PathStats {
        PathStats {
            steps: self.scene.simulation().steps(),
            frames: self.frames,
            field: Some(FieldSummary::of(self.scene.field())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::color::{BACKGROUND, pack_rgb};

    fn setup(variant: Variant, grid_size: u32) -> PathSetup {
        PathSetup {
            variant,
            grid_size,
            viewport: Viewport::new(200, 100, 1.0),
            seed: 7,
            render_scale: 0.5,
        }
    }

    #[test]
    fn rejects_bad_grid_sizes() {
        let mut backend = HostBackend::headless();
        let device = HostDevice { threads: 1 };
        let result = pollster::block_on(backend.allocate(device, &setup(Variant::Fluid, 100)));
        assert!(matches!(result, Err(NegotiationError::Allocation(_))));
    }

    #[test]
    fn frame_buffer_follows_render_scale() {
        let mut path = HostPath::new(&setup(Variant::Fluid, 32), None);
        assert_eq!(path.output_size(), (100, 50));
        path.resize(Viewport::new(400, 300, 2.0));
        assert_eq!(path.output_size(), (200, 150));
        assert_eq!(path.frame_buffer().len(), 200 * 150);
    }

    #[test]
    fn untouched_fluid_renders_background() {
        let mut path = HostPath::new(&setup(Variant::Fluid, 32), None);
        let frame = FrameTime {
            dt: 1.0 / 60.0,
            elapsed: 0.0,
            frame_index: 0,
        };
        path.render(&frame).unwrap();
        let bg = pack_rgb(BACKGROUND);
        let channel = |p: u32, shift: u32| ((p >> shift) & 0xff) as i32;
        for &p in path.frame_buffer() {
            for shift in [0, 8, 16] {
                assert!((channel(p, shift) - channel(bg, shift)).abs() <= 1);
            }
        }
        assert_eq!(path.stats().frames, 1);
    }
}
