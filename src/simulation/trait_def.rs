use crate::input::InteractionState;
use crate::time::FrameTime;

/// A stateful simulation advanced once per frame on the host
pub trait Simulation {
    /// Name of the simulation
    fn name(&self) -> &str;

    /// Advance by one frame
    fn step(&mut self, frame: &FrameTime, input: &InteractionState);

    /// Number of steps taken so far
    fn steps(&self) -> u64;
}
