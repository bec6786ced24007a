use std::sync::Arc;

use winit::window::Window;

use super::RenderError;
use super::color::BACKGROUND;
use super::post::post_uniforms;
use super::render_config::RenderConfig;
use super::render_pass::begin_post_pass;
use super::surface::{SurfaceErrorAction, classify_surface_error};
use super::upscale::{Upscaler, target_size};
use crate::backend::{AcceleratedPath, PathSetup, PathStats};
use crate::config::Variant;
use crate::input::InteractionState;
use crate::simulation::resources::GridResources;
use crate::simulation::synapse::SynapseNetwork;
use crate::simulation::types::{COMPUTE_WORKGROUP_SIZE, FluidUniforms, SynapseUniforms};
use crate::time::FrameTime;
use crate::viewport::Viewport;

// Host-side state that feeds the kernel each step
enum GpuScene {
    Fluid,
    Synapse(SynapseNetwork),
}

/// The accelerated path on a wgpu device: one compute dispatch per step over
/// ping-ponged storage buffers, then a post pass at `render_scale` that is
/// stretched over the surface.
pub struct GpuPath {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,
    upscaler: Upscaler,
    render_scale: f32,
    resources: GridResources,
    scene: GpuScene,
    variant: Variant,
    grid_size: u32,
    steps: u64,
    frames: u64,
}

fn post_target_size(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, scale: f32) -> (u32, u32) {
    let surface = Viewport::new(config.width, config.height, 1.0);
    target_size(surface, scale, device.limits().max_texture_dimension_2d)
}

impl GpuPath {
    /// `surface` must already be configured with `surface_config`.
    pub fn new(
        window: Arc<Window>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        setup: &PathSetup,
    ) -> Self {
        let render_config = RenderConfig::new(&device, surface_config.format, setup.variant);
        let upscaler = Upscaler::new(
            &device,
            surface_config.format,
            post_target_size(&device, &surface_config, setup.render_scale),
        );
        let scene = match setup.variant {
            Variant::Fluid => GpuScene::Fluid,
            Variant::Synapse => GpuScene::Synapse(SynapseNetwork::new(setup.seed)),
        };
        let node_capacity = match &scene {
            GpuScene::Fluid => 0,
            GpuScene::Synapse(network) => network.nodes().len(),
        };
        let resources = GridResources::new(
            &device,
            &render_config,
            setup.variant,
            setup.grid_size,
            node_capacity,
        );

        Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            render_config,
            upscaler,
            render_scale: setup.render_scale,
            resources,
            scene,
            variant: setup.variant,
            grid_size: setup.grid_size,
            steps: 0,
            frames: 0,
        }
    }

    fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> Result<(), RenderError> {
        match classify_surface_error(&err) {
            SurfaceErrorAction::Reconfigured => {
                log::debug!("surface {err:?}, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                Ok(())
            }
            SurfaceErrorAction::SkipFrame => {
                log::debug!("surface {err:?}, skipping frame");
                Ok(())
            }
            SurfaceErrorAction::Fatal => Err(RenderError::Surface(err)),
        }
    }
}

impl AcceleratedPath for GpuPath {
    fn name(&self) -> &str {
        "wgpu compute"
    }

    fn step(&mut self, frame: &FrameTime, input: &InteractionState) {
        match &mut self.scene {
            GpuScene::Fluid => {
                let uniforms = FluidUniforms::new(self.grid_size, frame, input);
                self.resources.update_fluid_uniforms(&self.queue, &uniforms);
            }
            GpuScene::Synapse(network) => {
                network.step(frame.elapsed, input);
                let nodes = network.gpu_nodes();
                let connections = network.gpu_connections();
                let uniforms = SynapseUniforms::new(
                    self.grid_size,
                    frame.elapsed,
                    nodes.len(),
                    connections.len(),
                );
                self.resources
                    .update_synapse(&self.queue, &uniforms, &nodes, &connections);
            }
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Grid Compute Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Grid Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.render_config.compute_pipeline);
            pass.set_bind_group(0, &self.resources.current().compute, &[]);
            let groups = self.grid_size.div_ceil(COMPUTE_WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, groups, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        // the slot just written becomes the one the post pass reads
        self.resources.swap_buffers();
        self.steps += 1;
    }

    fn render(&mut self, frame: &FrameTime) -> Result<(), RenderError> {
        let (width, height) = self.upscaler.size();
        let uniforms = post_uniforms(self.variant, self.grid_size, width, height, frame.elapsed);
        self.resources.update_post_uniforms(&self.queue, &uniforms);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return self.handle_surface_error(err),
        };
        let texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Post Encoder"),
        });
        {
            let mut pass = begin_post_pass(&mut encoder, self.upscaler.target(), BACKGROUND);
            pass.set_pipeline(&self.render_config.post_pipeline);
            pass.set_bind_group(0, &self.resources.current().post, &[]);
            pass.draw(0..4, 0..1);
        }
        self.upscaler.draw(&mut encoder, &texture_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.surface_config.width = viewport.width;
        self.surface_config.height = viewport.height;
        self.surface.configure(&self.device, &self.surface_config);
        let size = post_target_size(&self.device, &self.surface_config, self.render_scale);
        self.upscaler.resize(&self.device, size);
    }

    fn stats(&self) -> PathStats {
        PathStats {
            steps: self.steps,
            frames: self.frames,
            field: None,
        }
    }
}
