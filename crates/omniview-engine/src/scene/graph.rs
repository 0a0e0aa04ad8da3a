use crate::paint::Color;

use super::light::AmbientLight;
use super::object::Object3D;

/// Scene root.
///
/// Objects are append-only; an index returned by [`add`](Self::add) stays
/// valid for the scene's lifetime. Renderers rely on this to upload each
/// object once.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    pub ambient: AmbientLight,
    objects: Vec<Object3D>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            ambient: AmbientLight::new(Color::WHITE, 0.0),
            objects: Vec::new(),
        }
    }

    pub fn add(&mut self, object: Object3D) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn objects(&self) -> &[Object3D] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&Object3D> {
        self.objects.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
