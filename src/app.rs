use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::backend::NegotiationError;
use crate::backend::host::HostBackend;
use crate::backend::wgpu_backend::WgpuBackend;
use crate::config::{BackendPreference, EffectConfig};
use crate::effect::{Effect, FrameRequester};
use crate::logging::{LoggingConfig, init_logging};
use crate::rendering::presenter::{PixelSink, SoftPresenter};
use crate::viewport::Viewport;

/// Frames are driven by winit redraw requests.
pub struct WindowRequester(pub Arc<Window>);

impl FrameRequester for WindowRequester {
    fn request_frame(&self) {
        self.0.request_redraw();
    }
}

fn soft_presenter(window: &Arc<Window>) -> Option<Box<dyn PixelSink>> {
    match SoftPresenter::new(window.clone()) {
        Ok(presenter) => Some(Box::new(presenter)),
        Err(e) => {
            log::warn!("software presentation unavailable: {e}");
            None
        }
    }
}

fn viewport_of(window: &Window) -> Viewport {
    let size = window.inner_size();
    Viewport::new(size.width, size.height, window.scale_factor() as f32)
}

pub struct App {
    config: EffectConfig,
    window: Option<Arc<Window>>,
    effect: Option<Effect>,
}

impl App {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            window: None,
            effect: None,
        }
    }

    fn mount(&self, window: Arc<Window>) -> Effect {
        let presenter_window = window.clone();
        let mut effect = Effect::new(
            self.config.clone(),
            viewport_of(&window),
            Box::new(WindowRequester(window.clone())),
        )
        .with_sink_factory(move || soft_presenter(&presenter_window));

        match self.config.backend {
            BackendPreference::Auto => {
                let backend = WgpuBackend::new(window, self.config.gpu.clone());
                pollster::block_on(effect.attach(backend));
            }
            BackendPreference::Software => {
                let backend = match soft_presenter(&window) {
                    Some(sink) => HostBackend::new(sink),
                    None => HostBackend::headless(),
                };
                pollster::block_on(effect.attach(backend));
            }
            BackendPreference::Fallback => effect.fall_back(NegotiationError::Disabled),
        }

        effect
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(effect) = self.effect.as_mut() {
            effect.teardown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.effect.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title("fluid-backdrop");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let effect = self.mount(window.clone());
        log::info!("effect mounted on {:?} path", effect.path_kind());
        self.effect = Some(effect);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(effect), Some(window)) = (self.effect.as_mut(), self.window.as_ref()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested; stopping");
                self.shut_down(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shut_down(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = effect.frame() {
                    log::error!("rendering stopped: {e}");
                    self.shut_down(event_loop);
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                // Always followed by a redraw request.
                effect.resize(viewport_of(window));
            }
            WindowEvent::CursorMoved { position, .. } => {
                effect.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => effect.pointer_left(),
            WindowEvent::Touch(touch) => match touch.phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    effect.pointer_moved(touch.location.x as f32, touch.location.y as f32);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => effect.pointer_left(),
            },
            _ => (),
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = EffectConfig::from_env();
    log::info!(
        "starting {} backdrop (backend {:?}, grid {}, seed {})",
        config.variant,
        config.backend,
        config.grid_size,
        config.seed
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    // frames come from redraw requests only
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(())
}
