use glam::{Mat4, Vec3};

use super::light::PointLight;

/// Perspective camera.
///
/// `fov` is the vertical field of view in degrees. After changing `fov`,
/// `aspect`, `near` or `far`, call [`update_projection_matrix`] so the cached
/// projection matches.
///
/// Orientation is stored as a look-at target rather than a rotation; the
/// camera always faces `target` with +Y as the reference up vector.
///
/// [`update_projection_matrix`]: Self::update_projection_matrix
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub position: Vec3,
    pub up: Vec3,

    target: Vec3,
    projection: Mat4,

    /// Lights that move with the camera (world position == camera position).
    lights: Vec<PointLight>,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            up: Vec3::Y,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
            lights: Vec::new(),
        };
        cam.update_projection_matrix();
        cam
    }

    /// Vertical field of view in radians.
    #[inline]
    pub fn fov_radians(&self) -> f32 {
        self.fov.to_radians()
    }

    /// Points the camera at `target`.
    ///
    /// Looking at the camera's own position leaves the view matrix undefined.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Unit view direction (towards the target).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Camera-space +X expressed in world space.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Camera-space +Y expressed in world space.
    pub fn local_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_radians(), self.aspect, self.near, self.far);
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Attaches a light that follows the camera.
    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn projection_tracks_aspect_after_update() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        let before = cam.projection_matrix();

        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before, "cached until refreshed");

        cam.update_projection_matrix();
        let p = cam.projection_matrix();
        // x scale = f / aspect, y scale = f
        assert!(approx(p.x_axis.x * 2.0, p.y_axis.y));
    }

    #[test]
    fn view_maps_target_onto_negative_z() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.look_at(Vec3::ZERO);

        let t = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!(approx(t.x, 0.0) && approx(t.y, 0.0) && approx(t.z, -5.0));
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut cam = PerspectiveCamera::new(2.0, 1.0, 0.1, 1000.0);
        cam.position = Vec3::new(3.0, -2.0, 4.0);
        cam.look_at(Vec3::new(0.5, 0.5, 0.0));

        let (f, r, u) = (cam.forward(), cam.right(), cam.local_up());
        assert!(approx(f.length(), 1.0));
        assert!(approx(r.length(), 1.0));
        assert!(approx(u.length(), 1.0));
        assert!(approx(f.dot(r), 0.0));
        assert!(approx(f.dot(u), 0.0));
        assert!(approx(r.dot(u), 0.0));
    }

    #[test]
    fn attached_lights_are_kept() {
        let mut cam = PerspectiveCamera::new(2.0, 1.0, 0.1, 1000.0);
        cam.add_light(PointLight::new(crate::paint::Color::WHITE, 15.0));
        assert_eq!(cam.lights().len(), 1);
        assert_eq!(cam.lights()[0].intensity, 15.0);
    }
}
