use glam::{Vec3, Vec4};

/// Page background the effect composites over, `rgb(2, 6, 23)`.
pub const BACKGROUND: Vec3 = Vec3::new(2.0 / 255.0, 6.0 / 255.0, 23.0 / 255.0);

/// Synapse palette endpoints.
pub const SYNAPSE_CYAN: Vec3 = Vec3::new(0.0, 0.898, 1.0);
pub const SYNAPSE_PURPLE: Vec3 = Vec3::new(0.706, 0.29, 1.0);

// Convert HSL to RGB; all components in [0, 1], hue wraps.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 1.0 / 6.0 {
        (c, x, 0.0)
    } else if h < 2.0 / 6.0 {
        (x, c, 0.0)
    } else if h < 3.0 / 6.0 {
        (0.0, c, x)
    } else if h < 4.0 / 6.0 {
        (0.0, x, c)
    } else if h < 5.0 / 6.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Vec3::new(r + m, g + m, b + m)
}

/// Synapse node / connection color for a palette position in `[0, 1]`.
pub fn synapse_color(h: f32) -> Vec3 {
    SYNAPSE_CYAN.lerp(SYNAPSE_PURPLE, h)
}

/// Composites a premultiplied color over the page background.
pub fn over_background(premultiplied: Vec4) -> Vec3 {
    let alpha = premultiplied.w.clamp(0.0, 1.0);
    premultiplied.truncate() + BACKGROUND * (1.0 - alpha)
}

/// Packs a `[0, 1]` color into the `0RGB` layout used by the CPU presenter.
pub fn pack_rgb(color: Vec3) -> u32 {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + 0.5).as_uvec3();
    (c.x << 16) | (c.y << 8) | c.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_cyan() {
        let c = hsl_to_rgb(180.0 / 360.0, 1.0, 0.5);
        assert!(c.x.abs() < 1e-6);
        assert!((c.y - 1.0).abs() < 1e-6 && (c.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pack_clamps() {
        assert_eq!(pack_rgb(Vec3::new(2.0, -1.0, 1.0)), 0x00ff_00ff);
    }

    #[test]
    fn transparent_shows_background() {
        assert_eq!(over_background(Vec4::ZERO), BACKGROUND);
    }
}
