use wgpu::SurfaceError;

use crate::backend::wgpu_backend::GpuInit;

/// What the frame loop should do after a failed surface acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering resumes next frame.
    Reconfigured,
    /// Transient; drop this frame.
    SkipFrame,
    /// Out of memory; stop rendering.
    Fatal,
}

/// Lost/outdated surfaces are reconfigured, timeouts skipped, OOM is fatal.
pub fn classify_surface_error(err: &SurfaceError) -> SurfaceErrorAction {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

/// Picks a non-sRGB format when one exists: the post shader writes values
/// already shaped for display, like the browser canvas it mirrors.
pub fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    caps.formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first().copied())
}

pub fn configure_surface(
    device: &wgpu::Device,
    size: (u32, u32),
    surface: &wgpu::Surface<'_>,
    caps: &wgpu::SurfaceCapabilities,
    format: wgpu::TextureFormat,
    init: &GpuInit,
) -> wgpu::SurfaceConfiguration {
    let present_mode = if caps.present_modes.contains(&init.present_mode) {
        init.present_mode
    } else {
        wgpu::PresentMode::Fifo
    };

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.0.max(1),
        height: size.1.max(1),
        present_mode,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    };

    surface.configure(device, &config);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert_eq!(classify_surface_error(&SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify_surface_error(&SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(classify_surface_error(&SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
