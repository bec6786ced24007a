pub mod canvas;
pub mod color;
pub mod gpu_path;
pub mod post;
pub mod presenter;
pub mod render_config;
pub mod render_pass;
pub mod surface;
pub mod upscale;

use thiserror::Error;

pub use canvas::Canvas;
pub use gpu_path::GpuPath;
pub use presenter::{PixelSink, SoftPresenter};
pub use render_config::RenderConfig;

/// Frame presentation failures that stop the frame loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("software presentation failed: {0}")]
    Present(#[from] softbuffer::SoftBufferError),
    #[error("frame buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}
