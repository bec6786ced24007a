use std::num::NonZeroU32;
use std::sync::Arc;

use softbuffer::{Context, Surface};
use winit::window::Window;

use super::RenderError;

/// Destination of CPU-rendered frames.
pub trait PixelSink {
    /// Shows a `width × height` frame of `0RGB` pixels, scaled to the target.
    fn present(&mut self, width: usize, height: usize, pixels: &[u32]) -> Result<(), RenderError>;
}

/// Presents CPU frames into the window through softbuffer.
pub struct SoftPresenter {
    window: Arc<Window>,
    surface: Surface<Arc<Window>, Arc<Window>>,
}

impl SoftPresenter {
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let context = Context::new(window.clone())?;
        let surface = Surface::new(&context, window.clone())?;
        Ok(Self { window, surface })
    }
}

impl PixelSink for SoftPresenter {
    fn present(&mut self, width: usize, height: usize, pixels: &[u32]) -> Result<(), RenderError> {
        if pixels.len() != width * height {
            return Err(RenderError::BufferSize {
                expected: width * height,
                actual: pixels.len(),
            });
        }

        let size = self.window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            // minimized
            return Ok(());
        };

        self.surface.resize(w, h)?;
        let mut buffer = self.surface.buffer_mut()?;
        blit_scaled(pixels, width, height, &mut buffer, size.width as usize, size.height as usize);

        self.window.pre_present_notify();
        buffer.present()?;
        Ok(())
    }
}

/// Nearest-neighbour copy of `src` (`sw × sh`) onto `dst` (`dw × dh`).
pub fn blit_scaled(src: &[u32], sw: usize, sh: usize, dst: &mut [u32], dw: usize, dh: usize) {
    if sw == 0 || sh == 0 || dw == 0 {
        dst.fill(0);
        return;
    }
    for (y, row) in dst.chunks_mut(dw).take(dh).enumerate() {
        let sy = (y * sh / dh.max(1)).min(sh - 1);
        let src_row = &src[sy * sw..(sy + 1) * sw];
        for (x, px) in row.iter_mut().enumerate() {
            *px = src_row[(x * sw / dw).min(sw - 1)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_doubles_pixels() {
        let src = [1, 2, 3, 4];
        let mut dst = [0u32; 16];
        blit_scaled(&src, 2, 2, &mut dst, 4, 4);
        assert_eq!(&dst[..4], &[1, 1, 2, 2]);
        assert_eq!(&dst[12..], &[3, 3, 4, 4]);
    }

    #[test]
    fn blit_identity() {
        let src: Vec<u32> = (0..12).collect();
        let mut dst = vec![0u32; 12];
        blit_scaled(&src, 4, 3, &mut dst, 4, 3);
        assert_eq!(src, dst);
    }
}
