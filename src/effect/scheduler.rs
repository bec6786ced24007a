use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "dead" flag of one mounted effect.
///
/// Clones observe the same flag, so teardown from any handle stops frames
/// and in-flight negotiation alike.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    dead: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Idempotent.
    pub fn teardown(&self) {
        self.dead.store(true, Ordering::Release);
    }
}

/// Asks the host for the next display frame (winit: `request_redraw`).
pub trait FrameRequester {
    fn request_frame(&self);
}

/// What a delivered frame did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tick {
    Ran,
    /// The effect was dead; nothing ran and no frame was requested.
    Cancelled,
    /// No path has been chosen yet, or the frame was not one we asked for.
    Idle,
}

/// One unit of work per delivered frame, re-requested only while alive.
pub struct FrameScheduler {
    requester: Box<dyn FrameRequester>,
    lifecycle: Lifecycle,
    pending: bool,
    executed: u64,
}

impl FrameScheduler {
    pub fn new(requester: Box<dyn FrameRequester>, lifecycle: Lifecycle) -> Self {
        Self {
            requester,
            lifecycle,
            pending: false,
            executed: 0,
        }
    }

    /// Requests a frame unless one is already outstanding.
    pub fn start(&mut self) {
        if self.lifecycle.is_dead() || self.pending {
            return;
        }
        self.pending = true;
        self.requester.request_frame();
    }

    /// Runs `work` for a delivered frame and requests the next one.
    ///
    /// A frame nobody requested (an expose or resize redraw) runs nothing.
    /// Errors from `work` are returned without re-requesting.
    pub fn run_frame<E>(&mut self, work: impl FnOnce() -> Result<(), E>) -> Result<Tick, E> {
        if self.lifecycle.is_dead() {
            self.pending = false;
            return Ok(Tick::Cancelled);
        }
        if !self.pending {
            return Ok(Tick::Idle);
        }
        self.pending = false;

        self.executed += 1;
        work()?;
        self.start();
        Ok(Tick::Ran)
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
