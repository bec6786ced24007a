//! Mount, negotiation and teardown of an `Effect` against scripted backends.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use fluid_backdrop::backend::host::HostBackend;
use fluid_backdrop::backend::{AcceleratedPath, ComputeBackend, NegotiationError, PathSetup, PathStats};
use fluid_backdrop::config::EffectConfig;
use fluid_backdrop::effect::{Effect, FrameRequester, Lifecycle, PathKind, Tick};
use fluid_backdrop::input::InteractionState;
use fluid_backdrop::rendering::RenderError;
use fluid_backdrop::time::FrameTime;
use fluid_backdrop::viewport::Viewport;

#[derive(Clone, Default)]
struct Requests(Rc<Cell<u32>>);

impl FrameRequester for Requests {
    fn request_frame(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Counts live instances; stands in for adapters, devices and buffers.
struct Tracked(Rc<Cell<i32>>);

impl Tracked {
    fn new(live: &Rc<Cell<i32>>) -> Self {
        live.set(live.get() + 1);
        Self(live.clone())
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Stage {
    Adapter,
    Device,
    Allocate,
}

struct ScriptedPath {
    _buffers: Vec<Tracked>,
    steps: Rc<Cell<u64>>,
}

impl AcceleratedPath for ScriptedPath {
    fn name(&self) -> &str {
        "scripted"
    }

    fn step(&mut self, _frame: &FrameTime, _input: &InteractionState) {
        self.steps.set(self.steps.get() + 1);
    }

    fn render(&mut self, _frame: &FrameTime) -> Result<(), RenderError> {
        Ok(())
    }

    fn resize(&mut self, _viewport: Viewport) {}

    fn stats(&self) -> PathStats {
        PathStats {
            steps: self.steps.get(),
            ..PathStats::default()
        }
    }
}

#[derive(Default)]
struct ScriptedBackend {
    absent: bool,
    fail_at: Option<Stage>,
    kill_at: Option<(Stage, Lifecycle)>,
    calls: RefCell<Vec<&'static str>>,
    live: Rc<Cell<i32>>,
    steps: Rc<Cell<u64>>,
    // held for the backend's whole life, like an instance and its surface
    _instance: Option<Tracked>,
}

impl ScriptedBackend {
    fn stage(&self, stage: Stage, name: &'static str) -> Result<(), NegotiationError> {
        self.calls.borrow_mut().push(name);
        if let Some((at, lifecycle)) = &self.kill_at {
            if *at == stage {
                lifecycle.teardown();
            }
        }
        if self.fail_at == Some(stage) {
            return Err(NegotiationError::Allocation(format!("{name} failed")));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl ComputeBackend for ScriptedBackend {
    type Adapter = Tracked;
    type Device = (Tracked, Tracked);

    fn name(&self) -> &str {
        "scripted"
    }

    fn is_present(&self) -> bool {
        self.calls.borrow_mut().push("is_present");
        !self.absent
    }

    async fn request_adapter(&mut self) -> Result<Tracked, NegotiationError> {
        let adapter = Tracked::new(&self.live);
        self.stage(Stage::Adapter, "request_adapter")?;
        Ok(adapter)
    }

    async fn request_device(&mut self, adapter: Tracked) -> Result<(Tracked, Tracked), NegotiationError> {
        let device = Tracked::new(&self.live);
        self.stage(Stage::Device, "request_device")?;
        Ok((adapter, device))
    }

    async fn allocate(
        &mut self,
        device: (Tracked, Tracked),
        _setup: &PathSetup,
    ) -> Result<Box<dyn AcceleratedPath>, NegotiationError> {
        let mut buffers = vec![device.0, device.1];
        buffers.extend((0..4).map(|_| Tracked::new(&self.live)));
        self.stage(Stage::Allocate, "allocate")?;
        Ok(Box::new(ScriptedPath {
            _buffers: buffers,
            steps: self.steps.clone(),
        }))
    }
}

/// Negotiates, then falls back on failure the way the app does.
fn settle(effect: &mut Effect, backend: &mut ScriptedBackend) -> PathKind {
    match pollster::block_on(effect.negotiate(backend)) {
        Ok(kind) => kind,
        Err(reason) => {
            effect.fall_back(reason);
            effect.path_kind()
        }
    }
}

fn effect(requests: &Requests) -> Effect {
    let config = EffectConfig {
        grid_size: 32,
        fixed_timestep: Some(Duration::from_millis(16)),
        ..EffectConfig::default()
    };
    Effect::new(config, Viewport::new(160, 90, 1.0), Box::new(requests.clone()))
}

#[test]
fn absent_backend_falls_back_after_probe_only() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let mut backend = ScriptedBackend {
        absent: true,
        ..ScriptedBackend::default()
    };

    let kind = settle(&mut effect, &mut backend);

    assert_eq!(kind, PathKind::Fallback);
    assert_eq!(backend.calls(), vec!["is_present"]);
    assert_eq!(requests.0.get(), 1, "fallback starts its frame loop immediately");
    assert_eq!(effect.frame().unwrap(), Tick::Ran);
}

#[test]
fn failed_allocation_releases_everything() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let mut backend = ScriptedBackend {
        fail_at: Some(Stage::Allocate),
        ..ScriptedBackend::default()
    };

    let outcome = pollster::block_on(effect.negotiate(&mut backend));

    assert!(matches!(outcome, Err(NegotiationError::Allocation(_))));
    assert_eq!(effect.path_kind(), PathKind::Pending, "fallback is left to the caller");
    assert_eq!(
        backend.calls(),
        vec!["is_present", "request_adapter", "request_device", "allocate"]
    );
    assert_eq!(backend.live.get(), 0, "accelerated resources outlived the failure");
}

#[test]
fn failed_device_request_is_not_retried() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let mut backend = ScriptedBackend {
        fail_at: Some(Stage::Device),
        ..ScriptedBackend::default()
    };

    settle(&mut effect, &mut backend);
    assert!(pollster::block_on(effect.negotiate(&mut backend)).is_ok());

    assert!(effect.is_fallback());
    assert_eq!(
        backend.calls(),
        vec!["is_present", "request_adapter", "request_device"]
    );
    assert_eq!(backend.live.get(), 0);
}

#[test]
fn teardown_during_device_request_cancels() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let mut backend = ScriptedBackend {
        kill_at: Some((Stage::Device, effect.lifecycle())),
        ..ScriptedBackend::default()
    };

    let kind = settle(&mut effect, &mut backend);

    assert_eq!(kind, PathKind::Pending);
    assert!(!backend.calls().contains(&"allocate"));
    assert_eq!(backend.live.get(), 0);
    assert_eq!(requests.0.get(), 0, "no frame requested after teardown");
    assert_eq!(effect.frame().unwrap(), Tick::Cancelled);
    assert_eq!(effect.frames_run(), 0);
}

#[test]
fn teardown_with_frame_in_flight_runs_nothing() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let mut backend = ScriptedBackend::default();

    let kind = settle(&mut effect, &mut backend);
    assert_eq!(kind, PathKind::Accelerated);
    assert_eq!(requests.0.get(), 1);

    assert_eq!(effect.frame().unwrap(), Tick::Ran);
    assert_eq!(backend.steps.get(), 1);
    assert_eq!(requests.0.get(), 2, "next frame requested while alive");

    // the frame requested above is delivered after teardown
    effect.teardown();
    assert_eq!(effect.frame().unwrap(), Tick::Cancelled);

    assert_eq!(backend.steps.get(), 1);
    assert_eq!(effect.frames_run(), 1);
    assert_eq!(requests.0.get(), 2);
    assert_eq!(backend.live.get(), 0, "teardown releases the path");
}

#[test]
fn teardown_from_another_handle_stops_frames() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let handle = effect.lifecycle();
    effect.fall_back(NegotiationError::Disabled);

    assert_eq!(effect.frame().unwrap(), Tick::Ran);
    handle.teardown();
    assert_eq!(effect.frame().unwrap(), Tick::Cancelled);
    assert_eq!(effect.frames_run(), 1);
}

#[test]
fn host_backend_runs_the_grid() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    let kind = pollster::block_on(effect.attach(HostBackend::headless()));
    assert_eq!(kind, PathKind::Accelerated);

    effect.pointer_moved(40.0, 40.0);
    for i in 0..30 {
        effect.pointer_moved(40.0 + i as f32 * 3.0, 45.0);
        assert_eq!(effect.frame().unwrap(), Tick::Ran);
    }

    let stats = effect.path_stats().unwrap();
    assert_eq!(stats.steps, 30);
    assert_eq!(stats.frames, 30);
    let field = stats.field.unwrap();
    assert!(field.all_finite);
    assert!(field.total_density > 0.0, "pointer injected no dye");
}

#[test]
fn disabled_config_skips_negotiation() {
    let requests = Requests::default();
    let mut effect = effect(&requests);
    effect.fall_back(NegotiationError::Disabled);

    let mut backend = ScriptedBackend::default();
    assert_eq!(settle(&mut effect, &mut backend), PathKind::Fallback);
    assert!(backend.calls().is_empty());
}

#[test]
fn backend_is_released_before_the_canvas_is_created() {
    let requests = Requests::default();
    let live = Rc::new(Cell::new(0));
    let live_at_sink = Rc::new(Cell::new(None));

    let observed = live.clone();
    let seen = live_at_sink.clone();
    let mut effect = effect(&requests).with_sink_factory(move || {
        seen.set(Some(observed.get()));
        None
    });
    let backend = ScriptedBackend {
        fail_at: Some(Stage::Adapter),
        _instance: Some(Tracked::new(&live)),
        live: live.clone(),
        ..ScriptedBackend::default()
    };
    assert_eq!(live.get(), 1);

    let kind = pollster::block_on(effect.attach(backend));

    assert_eq!(kind, PathKind::Fallback);
    assert_eq!(live_at_sink.get(), Some(0), "canvas created while the backend was alive");
}
