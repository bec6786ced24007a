//! Pointer / touch interaction state.
//!
//! Mutated only by the window's input handlers and read once per frame by the
//! active simulation path. Both run on the event-loop thread, so no locking.

use glam::Vec2;

use crate::viewport::Viewport;

/// Geometric decay applied to the motion delta each frame.
pub const DELTA_DECAY: f32 = 0.82;

/// Gain applied to each normalized pointer displacement before accumulation.
pub const DELTA_GAIN: f32 = 3.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InteractionState {
    /// Normalized pointer position, origin top-left.
    position: Vec2,
    /// Accumulated, decaying motion delta in normalized units.
    delta: Vec2,
    active: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self {
            position: Vec2::splat(0.5),
            delta: Vec2::ZERO,
            active: false,
        }
    }

    /// Records a pointer or touch move given in physical pixels.
    ///
    /// The first move after the pointer (re-)enters only snaps the position so
    /// that entering the window does not register as a large jump.
    pub fn pointer_moved(&mut self, x: f32, y: f32, viewport: &Viewport) {
        let next = viewport.normalize(x, y);
        if self.active {
            self.delta += (next - self.position) * DELTA_GAIN;
        }
        self.position = next;
        self.active = true;
    }

    /// Pointer left the window or the touch ended.
    pub fn pointer_left(&mut self) {
        self.active = false;
        self.delta = Vec2::ZERO;
    }

    /// Once per frame: decays the motion delta toward zero.
    pub fn decay(&mut self) {
        self.delta *= DELTA_DECAY;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pointer position in the CPU canvas' logical pixel space.
    pub fn logical_position(&self, viewport: &Viewport) -> Vec2 {
        self.position * viewport.logical_size()
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(1000, 500, 1.0)
    }

    #[test]
    fn first_move_only_snaps() {
        let mut input = InteractionState::new();
        input.pointer_moved(100.0, 100.0, &viewport());
        assert!(input.is_active());
        assert_eq!(input.delta(), Vec2::ZERO);
        assert_eq!(input.position(), Vec2::new(0.1, 0.2));
    }

    #[test]
    fn delta_decays_monotonically_without_input() {
        let mut input = InteractionState::new();
        let vp = viewport();
        input.pointer_moved(100.0, 100.0, &vp);
        input.pointer_moved(300.0, 150.0, &vp);
        input.pointer_moved(450.0, 250.0, &vp);

        let mut previous = input.delta().length();
        assert!(previous > 0.0);
        for _ in 0..120 {
            input.decay();
            let current = input.delta().length();
            assert!(current <= previous, "delta grew: {previous} -> {current}");
            assert!((current - previous * DELTA_DECAY).abs() < 1e-6);
            previous = current;
        }
        assert!(previous < 1e-9);
    }

    #[test]
    fn leaving_zeroes_delta() {
        let mut input = InteractionState::new();
        let vp = viewport();
        input.pointer_moved(10.0, 10.0, &vp);
        input.pointer_moved(600.0, 400.0, &vp);
        input.pointer_left();
        assert!(!input.is_active());
        assert_eq!(input.delta(), Vec2::ZERO);
    }
}
