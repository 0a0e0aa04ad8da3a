/// Linear RGBA color with straight (non-premultiplied) alpha.
///
/// Hex and byte constructors take sRGB-encoded values and convert to linear,
/// so lighting math in the shader happens in linear space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_linear(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::from_linear(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn from_linear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from a `0xRRGGBB` sRGB literal.
    #[inline]
    pub fn from_hex(hex: u32) -> Self {
        Self::from_srgb_u8(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
            255,
        )
    }

    /// Creates a color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_srgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Creates a color from sRGB `f32` components in `[0, 1]`. Alpha is linear.
    #[inline]
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: srgb_to_linear(r.clamp(0.0, 1.0)),
            g: srgb_to_linear(g.clamp(0.0, 1.0)),
            b: srgb_to_linear(b.clamp(0.0, 1.0)),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// RGB scaled by `intensity`, alpha untouched. Used for light radiance.
    #[inline]
    pub fn scaled(self, intensity: f32) -> Self {
        Self {
            r: self.r * intensity,
            g: self.g * intensity,
            b: self.b * intensity,
            a: self.a,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_hex_is_linear_white() {
        let c = Color::from_hex(0xffffff);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 1.0).abs() < 1e-6);
        assert!((c.b - 1.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn mid_grey_is_darker_in_linear() {
        let c = Color::from_hex(0x808080);
        assert!(c.r > 0.2 && c.r < 0.23, "got {}", c.r);
    }

    #[test]
    fn hex_channels_are_ordered_rgb() {
        let c = Color::from_hex(0xff0000);
        assert_eq!(c.g, 0.0);
        assert_eq!(c.b, 0.0);
        assert!(c.r > 0.99);
    }

    #[test]
    fn scaled_leaves_alpha() {
        let c = Color::WHITE.scaled(15.0);
        assert_eq!(c.to_array(), [15.0, 15.0, 15.0, 1.0]);
    }
}
