//! The canvas path: particle determinism, population and presentation.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fluid_backdrop::backend::NegotiationError;
use fluid_backdrop::config::{EffectConfig, Variant};
use fluid_backdrop::effect::{Effect, FallbackScene, FrameRequester};
use fluid_backdrop::input::InteractionState;
use fluid_backdrop::rendering::RenderError;
use fluid_backdrop::rendering::color::{BACKGROUND, pack_rgb};
use fluid_backdrop::rendering::presenter::PixelSink;
use fluid_backdrop::simulation::ParticleSystem;
use fluid_backdrop::viewport::Viewport;

struct NoFrames;

impl FrameRequester for NoFrames {
    fn request_frame(&self) {}
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(usize, usize, Vec<u32>)>>>);

impl PixelSink for Recorder {
    fn present(&mut self, width: usize, height: usize, pixels: &[u32]) -> Result<(), RenderError> {
        self.0.borrow_mut().push((width, height, pixels.to_vec()));
        Ok(())
    }
}

fn scripted_input(viewport: &Viewport, steps: usize) -> Vec<InteractionState> {
    let mut input = InteractionState::new();
    (0..steps)
        .map(|i| {
            if i > 20 && i < 80 {
                input.pointer_moved(100.0 + i as f32 * 4.0, 150.0 + (i as f32 * 0.3).sin() * 40.0, viewport);
            } else if i == 80 {
                input.pointer_left();
            }
            input.decay();
            input
        })
        .collect()
}

#[test]
fn equal_seeds_give_equal_trajectories() {
    let viewport = Viewport::new(640, 360, 1.0);
    let inputs = scripted_input(&viewport, 200);

    let mut a = ParticleSystem::new(viewport, 42);
    let mut b = ParticleSystem::new(viewport, 42);
    for input in &inputs {
        a.advance(input);
        b.advance(input);
    }
    assert_eq!(a.particles(), b.particles());

    let mut c = ParticleSystem::new(viewport, 43);
    for input in &inputs {
        c.advance(input);
    }
    assert_ne!(a.particles(), c.particles());
}

#[test]
fn population_is_constant() {
    let viewport = Viewport::new(800, 600, 2.0);
    let mut system = ParticleSystem::new(viewport, 9);
    let count = system.len();
    assert!(count > 0);

    for input in scripted_input(&viewport, 300) {
        system.advance(&input);
        assert_eq!(system.len(), count);
    }

    // resizing never changes the population
    system.resize(Viewport::new(200, 100, 1.0));
    system.advance(&InteractionState::new());
    assert_eq!(system.len(), count);
}

#[test]
fn pointer_displaces_nearby_particles() {
    let viewport = Viewport::new(400, 400, 1.0);
    let mut control = ParticleSystem::new(viewport, 5);
    let mut touched = ParticleSystem::new(viewport, 5);

    let target = touched.particles()[0].position;
    let mut input = InteractionState::new();
    input.pointer_moved(target.x + 10.0, target.y, &viewport);

    control.advance(&InteractionState::new());
    touched.advance(&input);

    let moved = touched.particles()[0].position.distance(control.particles()[0].position);
    assert!(moved > 0.0, "pointer had no effect on particle 0");
}

#[test]
fn fallback_effect_presents_canvas() {
    let recorder = Recorder::default();
    let sink = recorder.clone();
    let config = EffectConfig {
        variant: Variant::Fluid,
        fixed_timestep: Some(Duration::from_millis(16)),
        ..EffectConfig::default()
    };
    let mut effect = Effect::new(config, Viewport::new(200, 120, 1.0), Box::new(NoFrames))
        .with_sink_factory(move || Some(Box::new(sink.clone()) as Box<dyn PixelSink>));

    effect.fall_back(NegotiationError::Unavailable);
    for _ in 0..5 {
        effect.frame().unwrap();
    }

    let frames = recorder.0.borrow();
    assert_eq!(frames.len(), 5);
    let (w, h, pixels) = &frames[4];
    assert_eq!((*w, *h), (200, 120));
    assert_eq!(pixels.len(), 200 * 120);

    let background = pack_rgb(BACKGROUND);
    assert!(pixels.iter().any(|&p| p != background), "no particle drawn");

    let Some(FallbackScene::Particles(system)) = effect.fallback().map(|f| f.scene()) else {
        panic!("fluid variant falls back to particles");
    };
    assert!(!system.is_empty());
}
