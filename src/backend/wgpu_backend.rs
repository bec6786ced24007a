use std::sync::Arc;

use winit::window::Window;

use super::{AcceleratedPath, ComputeBackend, NegotiationError, PathSetup};
use crate::rendering::GpuPath;
use crate::rendering::surface::{choose_surface_format, configure_surface};
use crate::simulation::resources::field_bytes;

/// wgpu instance and surface knobs.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Falls back to FIFO when the surface does not support it.
    pub present_mode: wgpu::PresentMode,

    /// A hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            power_preference: wgpu::PowerPreference::LowPower,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Adapter plus the device and queue it granted.
pub struct WgpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

/// Hardware compute through wgpu, presenting into the window surface.
pub struct WgpuBackend {
    window: Arc<Window>,
    instance: wgpu::Instance,
    surface: Option<wgpu::Surface<'static>>,
    init: GpuInit,
}

impl WgpuBackend {
    /// Creates the instance and window surface. A surface that cannot be
    /// created makes the backend report itself absent.
    pub fn new(window: Arc<Window>, init: GpuInit) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = match instance.create_surface(window.clone()) {
            Ok(surface) => Some(surface),
            Err(e) => {
                log::warn!("{}", NegotiationError::from(e));
                None
            }
        };

        Self {
            window,
            instance,
            surface,
            init,
        }
    }
}

impl ComputeBackend for WgpuBackend {
    type Adapter = wgpu::Adapter;
    type Device = WgpuDevice;

    fn name(&self) -> &str {
        "wgpu"
    }

    fn is_present(&self) -> bool {
        self.surface.is_some()
    }

    async fn request_adapter(&mut self) -> Result<wgpu::Adapter, NegotiationError> {
        let adapter = self
            .instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: self.init.power_preference,
                compatible_surface: self.surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        // the post pass reads the field as a fragment storage buffer
        let required = wgpu::DownlevelFlags::COMPUTE_SHADERS | wgpu::DownlevelFlags::FRAGMENT_STORAGE;
        if !downlevel.flags.contains(required) {
            return Err(NegotiationError::NoCompute(info.name));
        }

        log::info!("adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);
        Ok(adapter)
    }

    async fn request_device(&mut self, adapter: wgpu::Adapter) -> Result<WgpuDevice, NegotiationError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Backdrop Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        device.on_uncaptured_error(Box::new(|err: wgpu::Error| log::error!("wgpu: {err}")));
        Ok(WgpuDevice { adapter, device, queue })
    }

    async fn allocate(
        &mut self,
        device: WgpuDevice,
        setup: &PathSetup,
    ) -> Result<Box<dyn AcceleratedPath>, NegotiationError> {
        let WgpuDevice { adapter, device, queue } = device;

        let needed = field_bytes(setup.grid_size);
        let limit = u64::from(device.limits().max_storage_buffer_binding_size);
        if needed > limit {
            return Err(NegotiationError::GridTooLarge { needed, limit });
        }

        let surface = self.surface.take().ok_or(NegotiationError::Unavailable)?;
        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps)
            .ok_or_else(|| NegotiationError::Allocation("surface reports no formats".into()))?;
        log::debug!("surface format {format:?}");

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let size = self.window.inner_size();
        let surface_config = configure_surface(
            &device,
            (size.width, size.height),
            &surface,
            &caps,
            format,
            &self.init,
        );
        let path = GpuPath::new(
            self.window.clone(),
            device.clone(),
            queue,
            surface,
            surface_config,
            setup,
        );

        let validation = device.pop_error_scope().await;
        let out_of_memory = device.pop_error_scope().await;
        if let Some(err) = validation.or(out_of_memory) {
            // dropping the path releases everything it created
            return Err(NegotiationError::Allocation(err.to_string()));
        }

        Ok(Box::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_init_uses_fifo() {
        let init = GpuInit::default();
        assert_eq!(init.present_mode, wgpu::PresentMode::Fifo);
        assert!(init.desired_maximum_frame_latency >= 1);
    }
}
