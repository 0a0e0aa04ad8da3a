use crate::paint::Color;

/// Uniform fill light; no direction, no falloff.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    #[inline]
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0)
    }
}

/// Omnidirectional light.
///
/// `distance == 0` means unlimited range. `decay` is the falloff exponent;
/// 2 is physically based inverse-square.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
        }
    }

    #[inline]
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}
