use glam::Vec2;

/// Largest device pixel ratio the software canvas honours.
pub const MAX_DRAW_SCALE: f32 = 2.0;

/// Drawable size of the output surface.
///
/// `width` / `height` are physical pixels; the CPU path works in logical
/// pixels (`physical / draw_scale`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel ratio used by the software canvas, capped at [`MAX_DRAW_SCALE`].
    pub fn draw_scale(&self) -> f32 {
        self.scale_factor.min(MAX_DRAW_SCALE)
    }

    pub fn physical_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn logical_size(&self) -> Vec2 {
        self.physical_size() / self.draw_scale()
    }

    /// Physical size times `scale`, rounded, never below one pixel.
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        let w = (self.width as f32 * scale).round().max(1.0) as u32;
        let h = (self.height as f32 * scale).round().max(1.0) as u32;
        (w, h)
    }

    /// Maps a physical pixel position to `[0, 1]²` (origin top-left).
    pub fn normalize(&self, x: f32, y: f32) -> Vec2 {
        let size = self.physical_size().max(Vec2::ONE);
        Vec2::new(x / size.x, y / size.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_size_rounds_and_never_collapses() {
        let viewport = Viewport::new(1001, 3, 1.0);
        assert_eq!(viewport.scaled(0.5), (501, 2));
        assert_eq!(viewport.scaled(0.1), (100, 1));
        assert_eq!(viewport.scaled(1.0), (1001, 3));
    }

    #[test]
    fn logical_size_caps_scale() {
        let viewport = Viewport::new(3000, 1500, 3.0);
        assert_eq!(viewport.logical_size(), Vec2::new(1500.0, 750.0));
    }

    #[test]
    fn normalize_handles_zero_size() {
        let viewport = Viewport::new(0, 0, 1.0);
        assert!(viewport.is_empty());
        assert!(viewport.normalize(10.0, 10.0).is_finite());
    }
}
