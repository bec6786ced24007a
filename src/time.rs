//! Frame timing.
//!
//! One `FrameClock` per effect instance; `tick()` once per executed frame.

use std::time::{Duration, Instant};

/// Largest delta time handed to the simulation, in seconds.
pub const MAX_FRAME_DT: f32 = 0.05;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Clamped time since the previous tick, in seconds.
    pub dt: f32,

    /// Time since the clock was created, in seconds.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
enum Source {
    Realtime { start: Instant, last: Instant },
    Fixed { step: Duration, elapsed: Duration },
}

/// Produces `FrameTime` snapshots, either from the wall clock or from a fixed
/// step (deterministic runs and tests).
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    frame_index: u64,
    dt_max: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            source: Source::Realtime { start: now, last: now },
            frame_index: 0,
            dt_max: MAX_FRAME_DT,
        }
    }

    /// A clock that advances by exactly `step` per tick.
    pub fn fixed(step: Duration) -> Self {
        Self {
            source: Source::Fixed {
                step,
                elapsed: Duration::ZERO,
            },
            frame_index: 0,
            dt_max: MAX_FRAME_DT,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let (dt, elapsed) = match &mut self.source {
            Source::Realtime { start, last } => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(*last).as_secs_f32();
                *last = now;
                (dt, now.saturating_duration_since(*start).as_secs_f32())
            }
            Source::Fixed { step, elapsed } => {
                *elapsed += *step;
                (step.as_secs_f32(), elapsed.as_secs_f32())
            }
        };

        let ft = FrameTime {
            dt: dt.min(self.dt_max),
            elapsed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_deterministic() {
        let mut clock = FrameClock::fixed(Duration::from_millis(16));
        let first = clock.tick();
        let second = clock.tick();
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert!((second.elapsed - 0.032).abs() < 1e-6);
    }

    #[test]
    fn long_steps_are_clamped() {
        let mut clock = FrameClock::fixed(Duration::from_millis(500));
        assert_eq!(clock.tick().dt, MAX_FRAME_DT);
    }
}
