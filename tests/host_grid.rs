//! Long runs of the host grid kernels and presentation stage.

use std::time::Duration;

use glam::Vec4;

use fluid_backdrop::backend::host::HostPath;
use fluid_backdrop::backend::{AcceleratedPath, PathSetup};
use fluid_backdrop::config::Variant;
use fluid_backdrop::input::InteractionState;
use fluid_backdrop::simulation::types::DYE_MAX;
use fluid_backdrop::simulation::{FluidGrid, Simulation, SynapseField};
use fluid_backdrop::time::FrameClock;
use fluid_backdrop::viewport::Viewport;

const STEPS: usize = 600;

fn assert_bounded(cells: &[Vec4]) {
    for (i, c) in cells.iter().enumerate() {
        assert!(c.is_finite(), "cell {i} not finite: {c}");
        assert!(
            c.cmpge(Vec4::ZERO).all() && c.cmple(Vec4::splat(DYE_MAX)).all(),
            "cell {i} out of range: {c}"
        );
    }
}

/// Pointer circling the middle of the window.
fn wiggle(input: &mut InteractionState, viewport: &Viewport, i: usize) {
    let angle = i as f32 * 0.05;
    let center = viewport.physical_size() * 0.5;
    input.pointer_moved(
        center.x + angle.cos() * center.x * 0.5,
        center.y + angle.sin() * center.y * 0.5,
        viewport,
    );
}

#[test]
fn fluid_grid_stays_finite_and_bounded() {
    let viewport = Viewport::new(256, 256, 1.0);
    let mut grid = FluidGrid::new(64);
    let mut clock = FrameClock::fixed(Duration::from_micros(16_667));
    let mut input = InteractionState::new();

    for i in 0..STEPS {
        if i % 3 != 0 {
            wiggle(&mut input, &viewport, i);
        }
        input.decay();
        grid.step(&clock.tick(), &input);
    }

    assert_eq!(grid.steps(), STEPS as u64);
    assert_bounded(grid.dye());
    assert!(grid.velocity().iter().all(|v| v.is_finite()));

    let cells = (grid.size() * grid.size()) as f32;
    let density = grid.total_density();
    assert!(density > 0.0 && density <= cells * DYE_MAX, "total density {density}");
}

#[test]
fn synapse_field_stays_finite_and_bounded() {
    let viewport = Viewport::new(200, 200, 1.0);
    let mut field = SynapseField::new(32, 11);
    let mut clock = FrameClock::fixed(Duration::from_micros(16_667));
    let mut input = InteractionState::new();

    for i in 0..STEPS {
        wiggle(&mut input, &viewport, i);
        input.decay();
        field.step(&clock.tick(), &input);
    }

    assert_bounded(field.grid().cells());
    for node in field.network().nodes() {
        assert!(node.position.is_finite());
        assert!((0.0..=1.0).contains(&node.activation), "activation {}", node.activation);
    }
}

#[test]
fn host_path_frames_are_finite() {
    for variant in [Variant::Fluid, Variant::Synapse] {
        let setup = PathSetup {
            variant,
            grid_size: 32,
            viewport: Viewport::new(120, 80, 1.0),
            seed: 3,
            render_scale: 0.5,
        };
        let mut path = HostPath::new(&setup, None);
        let mut clock = FrameClock::fixed(Duration::from_micros(16_667));
        let input = InteractionState::new();

        for _ in 0..60 {
            let frame = clock.tick();
            path.step(&frame, &input);
            path.render(&frame).unwrap();
        }

        let stats = path.stats();
        assert_eq!((stats.steps, stats.frames), (60, 60));
        let field = stats.field.unwrap();
        assert!(field.all_finite && field.max <= DYE_MAX, "{variant}: {field:?}");
        assert_eq!(path.frame_buffer().len(), 60 * 40);
        assert!(path.frame_buffer().iter().any(|&p| p != path.frame_buffer()[0]));
    }
}
