//! Minimal software 2D canvas for the fallback path.
//!
//! Coordinates are logical pixels; the backing store is physical pixels at
//! the viewport's draw scale. Every primitive blends source-over with a
//! straight (non-premultiplied) alpha.

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::rendering::color::{BACKGROUND, pack_rgb};
use crate::viewport::Viewport;

pub struct Canvas {
    width: usize,
    height: usize,
    scale: f32,
    pixels: Vec<Vec3>,
}

impl Canvas {
    pub fn new(viewport: Viewport) -> Self {
        let mut canvas = Self {
            width: 0,
            height: 0,
            scale: 1.0,
            pixels: Vec::new(),
        };
        canvas.resize(viewport);
        canvas
    }

    /// Reallocates the backing store and clears it to the background.
    pub fn resize(&mut self, viewport: Viewport) {
        self.scale = viewport.draw_scale();
        let logical = viewport.logical_size();
        self.width = (logical.x * self.scale).round() as usize;
        self.height = (logical.y * self.scale).round() as usize;
        self.pixels = vec![BACKGROUND; self.width * self.height];
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Vec3 {
        self.pixels[y * self.width + x]
    }

    fn blend(dst: &mut Vec3, color: Vec3, alpha: f32) {
        *dst = dst.lerp(color, alpha.clamp(0.0, 1.0));
    }

    /// Washes the whole canvas with `color` at `alpha`.
    pub fn fill(&mut self, color: Vec3, alpha: f32) {
        self.pixels
            .par_iter_mut()
            .for_each(|px| Self::blend(px, color, alpha));
    }

    // Visits physical pixels whose centers lie within `reach` of the physical
    // point `center`, clipped to the canvas.
    fn for_each_near(
        &mut self,
        center: Vec2,
        reach: f32,
        mut shade: impl FnMut(Vec2) -> Option<(Vec3, f32)>,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = (center.x - reach).floor().max(0.0) as usize;
        let y0 = (center.y - reach).floor().max(0.0) as usize;
        let x1 = ((center.x + reach).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((center.y + reach).ceil().max(0.0) as usize).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some((color, alpha)) = shade(p) {
                    Self::blend(&mut self.pixels[y * self.width + x], color, alpha);
                }
            }
        }
    }

    /// Anti-aliased disc.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32) {
        let c = center * self.scale;
        let r = radius * self.scale;
        self.for_each_near(c, r + 1.0, |p| {
            let coverage = (r - p.distance(c) + 0.5).clamp(0.0, 1.0);
            (coverage > 0.0).then_some((color, alpha * coverage))
        });
    }

    /// Disc whose alpha falls linearly from `alpha` at the center to zero at
    /// `radius`.
    pub fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32) {
        let c = center * self.scale;
        let r = (radius * self.scale).max(f32::EPSILON);
        self.for_each_near(c, r, |p| {
            let falloff = 1.0 - p.distance(c) / r;
            (falloff > 0.0).then_some((color, alpha * falloff))
        });
    }

    /// Anti-aliased line segment with butt ends.
    pub fn stroke_line(&mut self, a: Vec2, b: Vec2, width: f32, color: Vec3, alpha: f32) {
        let pa = a * self.scale;
        let pb = b * self.scale;
        let half = (width * self.scale * 0.5).max(0.5);
        let ab = pb - pa;
        let len2 = ab.length_squared();

        let scale = self.scale;
        let mid = (pa + pb) * 0.5;
        let reach = ab.length() * 0.5 + half + 1.0;
        self.for_each_near(mid, reach, |p| {
            let t = if len2 > 0.0 { (p - pa).dot(ab) / len2 } else { 0.0 };
            if !(0.0..=1.0).contains(&t) {
                return None;
            }
            let d = p.distance(pa + ab * t);
            let coverage = (half - d + 0.5).clamp(0.0, 1.0);
            // hairlines fade instead of thinning below one pixel
            let thin = (width * scale).min(1.0);
            (coverage > 0.0).then_some((color, alpha * coverage * thin))
        });
    }

    /// Packs the canvas into `0RGB` pixels; `out` must hold `width × height`.
    pub fn write_rgb(&self, out: &mut [u32]) {
        out.par_iter_mut()
            .zip(self.pixels.par_iter())
            .for_each(|(dst, src)| *dst = pack_rgb(*src));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_tracks_draw_scale() {
        let canvas = Canvas::new(Viewport::new(300, 200, 3.0));
        // scale is capped at 2, but the physical size is preserved
        assert_eq!((canvas.width(), canvas.height()), (300, 200));
        assert!(canvas.pixels().iter().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn circle_covers_center_not_corner() {
        let mut canvas = Canvas::new(Viewport::new(20, 20, 1.0));
        canvas.fill_circle(Vec2::new(10.0, 10.0), 3.0, Vec3::ONE, 1.0);
        assert_eq!(canvas.pixel(10, 10), Vec3::ONE);
        assert_eq!(canvas.pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn repeated_fill_converges_to_color() {
        let mut canvas = Canvas::new(Viewport::new(4, 4, 1.0));
        canvas.fill_circle(Vec2::new(2.0, 2.0), 2.0, Vec3::ONE, 1.0);
        for _ in 0..400 {
            canvas.fill(BACKGROUND, 0.04);
        }
        assert!(canvas.pixel(2, 2).distance(BACKGROUND) < 1e-3);
    }

    #[test]
    fn line_is_drawn_between_endpoints() {
        let mut canvas = Canvas::new(Viewport::new(20, 20, 1.0));
        canvas.stroke_line(Vec2::new(2.0, 10.0), Vec2::new(18.0, 10.0), 2.0, Vec3::ONE, 1.0);
        assert!(canvas.pixel(10, 10).x > 0.9);
        assert_eq!(canvas.pixel(10, 2), BACKGROUND);
        assert_eq!(canvas.pixel(0, 10), BACKGROUND);
    }

    #[test]
    fn gradient_fades_outward() {
        let mut canvas = Canvas::new(Viewport::new(40, 40, 1.0));
        canvas.fill_radial_gradient(Vec2::new(20.0, 20.0), 15.0, Vec3::ONE, 0.5);
        let near = canvas.pixel(20, 20).x;
        let far = canvas.pixel(31, 20).x;
        assert!(near > far && far > BACKGROUND.x);
    }
}
