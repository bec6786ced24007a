//! The canvas path used when no accelerated backend could be negotiated.

use crate::backend::PathStats;
use crate::config::Variant;
use crate::input::InteractionState;
use crate::rendering::RenderError;
use crate::rendering::canvas::Canvas;
use crate::rendering::color::{BACKGROUND, hsl_to_rgb, synapse_color};
use crate::rendering::presenter::PixelSink;
use crate::simulation::particles::ParticleSystem;
use crate::simulation::synapse::SynapseNetwork;
use crate::simulation::trait_def::Simulation;
use crate::time::FrameTime;
use crate::viewport::Viewport;

const PARTICLE_TRAIL: f32 = 0.04;
const SYNAPSE_TRAIL: f32 = 0.12;
const PARTICLE_RADIUS: f32 = 1.1;
const BURST_RADIUS: f32 = 50.0;
const BURST_ALPHA: f32 = 0.06;

pub enum FallbackScene {
    Particles(ParticleSystem),
    Synapse(SynapseNetwork),
}

pub struct FallbackPath {
    scene: FallbackScene,
    canvas: Canvas,
    viewport: Viewport,
    sink: Option<Box<dyn PixelSink>>,
    frame_buffer: Vec<u32>,
    steps: u64,
    frames: u64,
}

impl FallbackPath {
    pub fn new(variant: Variant, viewport: Viewport, seed: u64, sink: Option<Box<dyn PixelSink>>) -> Self {
        let scene = match variant {
            Variant::Fluid => FallbackScene::Particles(ParticleSystem::new(viewport, seed)),
            Variant::Synapse => FallbackScene::Synapse(SynapseNetwork::new(seed)),
        };
        let canvas = Canvas::new(viewport);
        let frame_buffer = vec![0; canvas.width() * canvas.height()];

        Self {
            scene,
            canvas,
            viewport,
            sink,
            frame_buffer,
            steps: 0,
            frames: 0,
        }
    }

    pub fn scene(&self) -> &FallbackScene {
        &self.scene
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn step(&mut self, frame: &FrameTime, input: &InteractionState) {
        match &mut self.scene {
            FallbackScene::Particles(system) => system.step(frame, input),
            FallbackScene::Synapse(network) => network.step(frame.elapsed, input),
        }
        self.steps += 1;
    }

    /// Draws the current state over the faded previous frame and presents it.
    pub fn render(&mut self) -> Result<(), RenderError> {
        match &self.scene {
            FallbackScene::Particles(system) => draw_particles(&mut self.canvas, system),
            FallbackScene::Synapse(network) => {
                draw_synapse(&mut self.canvas, network, self.viewport)
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            self.canvas.write_rgb(&mut self.frame_buffer);
            sink.present(self.canvas.width(), self.canvas.height(), &self.frame_buffer)?;
        }
        self.frames += 1;
        Ok(())
    }

    /// Clears the canvas; simulation state is kept.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.canvas.resize(viewport);
        self.frame_buffer = vec![0; self.canvas.width() * self.canvas.height()];
        if let FallbackScene::Particles(system) = &mut self.scene {
            system.resize(viewport);
        }
    }

    pub fn stats(&self) -> PathStats {
        PathStats {
            steps: self.steps,
            frames: self.frames,
            field: None,
        }
    }
}

fn draw_particles(canvas: &mut Canvas, system: &ParticleSystem) {
    canvas.fill(BACKGROUND, PARTICLE_TRAIL);

    let params = system.params();
    for p in system.particles() {
        let color = hsl_to_rgb(p.hue / 360.0, p.saturation(), p.lightness());
        canvas.fill_circle(p.position, PARTICLE_RADIUS, color, p.alpha(params));
    }

    if let Some(burst) = system.burst() {
        let color = hsl_to_rgb(burst.hue / 360.0, 0.9, 0.7);
        canvas.fill_radial_gradient(burst.center, BURST_RADIUS, color, BURST_ALPHA);
    }
}

fn draw_synapse(canvas: &mut Canvas, network: &SynapseNetwork, viewport: Viewport) {
    canvas.fill(BACKGROUND, SYNAPSE_TRAIL);

    let size = viewport.logical_size();
    let nodes = network.nodes();
    let max_distance = network.params().connection_distance;

    for c in network.connections() {
        let (a, b) = (&nodes[c.a], &nodes[c.b]);
        let strength = c.strength(nodes, max_distance);
        let activation = c.mean_activation(nodes);
        let color = synapse_color((a.hue + b.hue) * 0.5);
        canvas.stroke_line(
            a.position * size,
            b.position * size,
            0.3 + strength * activation * 2.0,
            color,
            strength * (0.06 + activation * 0.35),
        );
    }

    for node in nodes {
        let center = node.position * size;
        let radius = 3.0 + node.activation * 5.0;
        let alpha = 0.25 + node.activation * 0.75;
        let color = synapse_color(node.hue);
        canvas.fill_radial_gradient(center, radius * 8.0, color, alpha * 0.25);
        canvas.fill_circle(center, radius, color, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::time::FrameClock;

    #[test]
    fn synapse_fallback_lights_nodes() {
        let viewport = Viewport::new(320, 240, 1.0);
        let mut path = FallbackPath::new(Variant::Synapse, viewport, 5, None);
        let mut clock = FrameClock::fixed(Duration::from_millis(16));
        let input = InteractionState::new();
        for _ in 0..10 {
            path.step(&clock.tick(), &input);
            path.render().unwrap();
        }

        let FallbackScene::Synapse(network) = path.scene() else {
            panic!("expected synapse scene");
        };
        let node = network.nodes()[0];
        let center = node.position * viewport.logical_size();
        let x = (center.x as usize).min(path.canvas().width() - 1);
        let y = (center.y as usize).min(path.canvas().height() - 1);
        let lit = path.canvas().pixel(x, y);
        assert!(lit.length() > BACKGROUND.length(), "node pixel {lit}");
        assert_eq!(path.stats().frames, 10);
    }

    #[test]
    fn resize_clears_canvas() {
        let mut path = FallbackPath::new(Variant::Fluid, Viewport::new(100, 80, 1.0), 1, None);
        path.render().unwrap();
        path.resize(Viewport::new(60, 40, 1.0));
        assert_eq!(path.canvas().width(), 60);
        assert!(path.canvas().pixels().iter().all(|p| *p == BACKGROUND));
    }
}
