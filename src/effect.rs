//! One mounted backdrop: chooses a path once, then runs it one frame at a time
//! until teardown.

mod fallback;
mod scheduler;

pub use fallback::{FallbackPath, FallbackScene};
pub use scheduler::{FrameRequester, FrameScheduler, Lifecycle, Tick};

use crate::backend::{
    AcceleratedPath, ComputeBackend, Negotiated, NegotiationError, PathSetup, PathStats, negotiate,
};
use crate::config::EffectConfig;
use crate::input::InteractionState;
use crate::rendering::RenderError;
use crate::rendering::presenter::PixelSink;
use crate::time::FrameClock;
use crate::viewport::Viewport;

/// Which path an effect ended up on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathKind {
    /// Not negotiated yet, or negotiation was cancelled.
    Pending,
    Accelerated,
    Fallback,
}

enum ActivePath {
    Accelerated(Box<dyn AcceleratedPath>),
    Fallback(FallbackPath),
}

type SinkFactory = Box<dyn FnMut() -> Option<Box<dyn PixelSink>>>;

pub struct Effect {
    config: EffectConfig,
    viewport: Viewport,
    input: InteractionState,
    clock: FrameClock,
    lifecycle: Lifecycle,
    scheduler: FrameScheduler,
    path: Option<ActivePath>,
    probed: bool,
    sink_factory: Option<SinkFactory>,
}

impl Effect {
    pub fn new(config: EffectConfig, viewport: Viewport, requester: Box<dyn FrameRequester>) -> Self {
        let lifecycle = Lifecycle::new();
        let clock = match config.fixed_timestep {
            Some(step) => FrameClock::fixed(step),
            None => FrameClock::new(),
        };

        Self {
            config,
            viewport,
            input: InteractionState::new(),
            clock,
            scheduler: FrameScheduler::new(requester, lifecycle.clone()),
            lifecycle,
            path: None,
            probed: false,
            sink_factory: None,
        }
    }

    /// Where the fallback path presents its canvas. Without one it draws
    /// off-screen.
    pub fn with_sink_factory(
        mut self,
        factory: impl FnMut() -> Option<Box<dyn PixelSink>> + 'static,
    ) -> Self {
        self.sink_factory = Some(Box::new(factory));
        self
    }

    /// A handle that can tear this effect down from elsewhere.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn setup(&self) -> PathSetup {
        PathSetup::from_config(&self.config, self.viewport)
    }

    /// Probes `backend` once and starts the frame loop if it yields an
    /// accelerated path.
    ///
    /// A failed probe returns the reason without starting the fallback, so
    /// the caller can release the backend first. Later calls return the
    /// current path without probing again.
    pub async fn negotiate<B: ComputeBackend>(
        &mut self,
        backend: &mut B,
    ) -> Result<PathKind, NegotiationError> {
        if self.probed || self.path.is_some() || self.lifecycle.is_dead() {
            return Ok(self.path_kind());
        }
        self.probed = true;

        let setup = self.setup();
        let lifecycle = self.lifecycle.clone();
        match negotiate(backend, &setup, &lifecycle).await {
            Negotiated::Accelerated(path) => {
                log::info!("{} effect on accelerated path ({})", self.config.variant, path.name());
                self.path = Some(ActivePath::Accelerated(path));
                self.scheduler.start();
            }
            Negotiated::Fallback(reason) => return Err(reason),
            Negotiated::Cancelled => log::debug!("negotiation cancelled by teardown"),
        }
        Ok(self.path_kind())
    }

    /// Negotiates on `backend`, drops it, and only then falls back if it
    /// failed. The canvas never shares the window with a live backend.
    pub async fn attach<B: ComputeBackend>(&mut self, mut backend: B) -> PathKind {
        let outcome = self.negotiate(&mut backend).await;
        drop(backend);
        if let Err(reason) = outcome {
            self.fall_back(reason);
        }
        self.path_kind()
    }

    /// Switches to the canvas path for good. No-op once a path is chosen or
    /// after teardown.
    pub fn fall_back(&mut self, reason: NegotiationError) {
        if self.path.is_some() || self.lifecycle.is_dead() {
            return;
        }
        log::warn!("{} effect falling back to canvas: {reason}", self.config.variant);

        let sink = self.sink_factory.as_mut().and_then(|make| make());
        self.path = Some(ActivePath::Fallback(FallbackPath::new(
            self.config.variant,
            self.viewport,
            self.config.seed,
            sink,
        )));
        self.scheduler.start();
    }

    /// Handles one delivered display frame: step, then render.
    pub fn frame(&mut self) -> Result<Tick, RenderError> {
        let Some(path) = self.path.as_mut() else {
            return Ok(if self.lifecycle.is_dead() { Tick::Cancelled } else { Tick::Idle });
        };

        let clock = &mut self.clock;
        let input = &mut self.input;
        self.scheduler.run_frame(|| {
            let frame = clock.tick();
            input.decay();
            match path {
                ActivePath::Accelerated(path) => {
                    path.step(&frame, input);
                    path.render(&frame)
                }
                ActivePath::Fallback(path) => {
                    path.step(&frame, input);
                    path.render()
                }
            }
        })
    }

    /// Reconfigures the output; the simulation grid keeps its size.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.lifecycle.is_dead() {
            return;
        }
        match self.path.as_mut() {
            Some(ActivePath::Accelerated(path)) => path.resize(viewport),
            Some(ActivePath::Fallback(path)) => path.resize(viewport),
            None => {}
        }
    }

    /// Pointer or touch position in physical pixels.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.input.pointer_moved(x, y, &self.viewport);
    }

    pub fn pointer_left(&mut self) {
        self.input.pointer_left();
    }

    /// Stops the frame loop and releases the active path. Idempotent.
    pub fn teardown(&mut self) {
        if !self.lifecycle.is_dead() {
            log::debug!("effect torn down after {} frames", self.scheduler.executed());
        }
        self.lifecycle.teardown();
        self.path = None;
    }

    pub fn is_fallback(&self) -> bool {
        self.path_kind() == PathKind::Fallback
    }

    pub fn path_kind(&self) -> PathKind {
        match self.path {
            None => PathKind::Pending,
            Some(ActivePath::Accelerated(_)) => PathKind::Accelerated,
            Some(ActivePath::Fallback(_)) => PathKind::Fallback,
        }
    }

    /// Frames that ran simulation work.
    pub fn frames_run(&self) -> u64 {
        self.scheduler.executed()
    }

    pub fn path_stats(&self) -> Option<PathStats> {
        match self.path.as_ref()? {
            ActivePath::Accelerated(path) => Some(path.stats()),
            ActivePath::Fallback(path) => Some(path.stats()),
        }
    }

    pub fn fallback(&self) -> Option<&FallbackPath> {
        match self.path.as_ref()? {
            ActivePath::Fallback(path) => Some(path),
            ActivePath::Accelerated(_) => None,
        }
    }

    pub fn input(&self) -> &InteractionState {
        &self.input
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
