//! Camera framing.
//!
//! Places a perspective camera along a view direction so that an object's
//! largest extent fits the vertical field of view, with a margin.

use glam::Vec3;

use crate::math::Aabb;

use super::camera::PerspectiveCamera;
use super::object::Object3D;

/// Margin used when the caller has no preference.
pub const DEFAULT_FIT_MARGIN: f32 = 1.25;

/// Anything that can report world-space bounds.
pub trait WorldBounds {
    fn world_bounds(&self) -> Aabb;
}

impl WorldBounds for Aabb {
    fn world_bounds(&self) -> Aabb {
        *self
    }
}

impl WorldBounds for Object3D {
    fn world_bounds(&self) -> Aabb {
        Object3D::world_bounds(self)
    }
}

/// Distance at which an extent of `max_dim` spans a vertical fov of
/// `fov_degrees`, multiplied by `margin`.
#[inline]
pub fn fitting_distance(max_dim: f32, fov_degrees: f32, margin: f32) -> f32 {
    let fov = fov_degrees.to_radians();
    (max_dim / 2.0) / (fov / 2.0).tan() * margin
}

/// Moves `camera` onto `center + normalize(view_direction) * distance`, looks
/// at the center and refreshes the projection. Returns the distance.
///
/// Degenerate bounds give a distance of 0, which puts the camera on the
/// center. A zero `view_direction` yields a NaN position. Neither is guarded.
pub fn fit_camera_to_object<T>(
    camera: &mut PerspectiveCamera,
    object: &T,
    view_direction: Vec3,
    margin: f32,
) -> f32
where
    T: WorldBounds + ?Sized,
{
    let bounds = object.world_bounds();
    let center = bounds.center();
    let distance = fitting_distance(bounds.max_dimension(), camera.fov, margin);

    camera.position = center + view_direction.normalize() * distance;
    camera.look_at(center);
    camera.update_projection_matrix();

    log::debug!(
        "framed camera: center={center:?} max_dim={} distance={distance}",
        bounds.max_dimension()
    );

    distance
}

/// [`fit_camera_to_object`] with [`DEFAULT_FIT_MARGIN`].
pub fn fit_camera_to_object_default<T>(
    camera: &mut PerspectiveCamera,
    object: &T,
    view_direction: Vec3,
) -> f32
where
    T: WorldBounds + ?Sized,
{
    fit_camera_to_object(camera, object, view_direction, DEFAULT_FIT_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn camera(fov: f32) -> PerspectiveCamera {
        let mut c = PerspectiveCamera::new(fov, 1.0, 0.1, 1000.0);
        c.position = Vec3::new(0.0, 0.0, 2.5);
        c
    }

    // ── distance formula ──────────────────────────────────────────────────

    #[test]
    fn distance_matches_closed_form() {
        for (max_dim, fov, margin) in [(1.0f32, 45.0f32, 1.0f32), (3.5, 60.0, 1.25), (0.02, 2.0, 2.0)] {
            let expected: f32 = (max_dim / 2.0) / (fov.to_radians() / 2.0).tan() * margin;
            let got = fitting_distance(max_dim, fov, margin);
            assert!((got - expected).abs() <= expected.abs() * 1e-6, "{got} vs {expected}");
        }
    }

    #[test]
    fn two_by_one_by_one_box_at_two_degrees() {
        let bounds = Aabb::from_center_size(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 1.0, 1.0));
        let mut cam = camera(2.0);

        let d = fit_camera_to_object(&mut cam, &bounds, Vec3::new(0.0, -1.0, 1.0), 2.0);

        assert!((d - 114.58).abs() < 0.01, "got {d}");
        assert!((cam.position.distance(bounds.center()) - d).abs() < EPS);
    }

    #[test]
    fn default_margin_is_one_and_a_quarter() {
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::splat(1.0));
        let mut a = camera(30.0);
        let mut b = camera(30.0);

        let d_default = fit_camera_to_object_default(&mut a, &bounds, Vec3::Z);
        let d_explicit = fit_camera_to_object(&mut b, &bounds, Vec3::Z, 1.25);

        assert_eq!(d_default, d_explicit);
        assert_eq!(a.position, b.position);
    }

    // ── placement ─────────────────────────────────────────────────────────

    #[test]
    fn direction_magnitude_does_not_matter() {
        let bounds = Aabb::from_center_size(Vec3::new(-4.0, 0.5, 9.0), Vec3::new(1.0, 3.0, 2.0));
        let center = bounds.center();

        for dir in [
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(0.0, -10.0, 10.0),
            Vec3::new(0.0, -0.001, 0.001),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(7.0, 0.0, 0.0),
        ] {
            let mut cam = camera(2.0);
            let d = fit_camera_to_object(&mut cam, &bounds, dir, 1.25);

            let offset = cam.position - center;
            assert!((offset.length() - d).abs() < d * 1e-5, "dir {dir:?}");
            assert!((offset.normalize() - dir.normalize()).length() < 1e-5, "dir {dir:?}");
        }
    }

    #[test]
    fn camera_looks_at_center_and_projection_is_refreshed() {
        let bounds = Aabb::from_center_size(Vec3::new(0.0, -0.95, 0.0), Vec3::splat(0.5));
        let mut cam = camera(2.0);
        cam.aspect = 4.0 / 3.0;

        fit_camera_to_object(&mut cam, &bounds, Vec3::new(0.0, -1.0, 1.0), 2.0);

        assert_eq!(cam.target(), bounds.center());
        let p = cam.projection_matrix();
        assert!((p.y_axis.y / p.x_axis.x - 4.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn object_bounds_are_used() {
        let mut obj = Object3D::new("box");
        obj.meshes.push(crate::scene::Mesh {
            positions: vec![[-1.0, -0.5, -0.5], [1.0, 0.5, 0.5]],
            ..Default::default()
        });
        let mut cam = camera(2.0);

        let d = fit_camera_to_object(&mut cam, &obj, Vec3::X, 2.0);
        assert!((d - 114.58).abs() < 0.01);
    }

    // ── degenerate ────────────────────────────────────────────────────────

    #[test]
    fn degenerate_bounds_collapse_onto_center() {
        let point = Aabb::from_points([Vec3::new(1.0, 1.0, 1.0)]);
        let mut cam = camera(2.0);

        let d = fit_camera_to_object(&mut cam, &point, Vec3::Z, 1.25);

        assert_eq!(d, 0.0);
        assert_eq!(cam.position, Vec3::new(1.0, 1.0, 1.0));
    }
}
