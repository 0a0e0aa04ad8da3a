//! CPU-side layouts of the mesh shader's vertex and uniform data.
//!
//! Everything here is plain `Pod` data so it can be built and checked without
//! a GPU. Field order and padding must match `shaders/mesh.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::paint::Color;
use crate::scene::{Material, Mesh, Object3D, PerspectiveCamera, Scene};

// ── vertex ────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Interleaves a mesh's attribute streams. Missing normals or uvs become zero.
pub(super) fn interleave(mesh: &Mesh) -> Vec<MeshVertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, p)| MeshVertex {
            position: *p,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0; 3]),
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0; 2]),
        })
        .collect()
}

// ── frame uniform ─────────────────────────────────────────────────────────

/// Per-frame data: camera, ambient light, and the camera-attached point light.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// rgb = color * intensity.
    pub ambient: [f32; 4],
    /// xyz = world position, w = cutoff distance (0 = infinite).
    pub light_pos: [f32; 4],
    /// rgb = color * intensity, w = decay exponent.
    pub light_color: [f32; 4],
}

impl FrameUniform {
    /// Only the first attached light is shaded; without one the light term is black.
    pub(super) fn new(camera: &PerspectiveCamera, scene: &Scene) -> Self {
        let eye = camera.position;
        let ambient = scene.ambient.radiance();

        let lp = attached_light_position(camera);

        let (light_pos, light_color) = match camera.lights().first() {
            Some(light) => {
                let c = light.radiance();
                (
                    [lp.x, lp.y, lp.z, light.distance],
                    [c.r, c.g, c.b, light.decay],
                )
            }
            None => ([lp.x, lp.y, lp.z, 0.0], [0.0; 4]),
        };

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, 1.0],
            ambient: [ambient.r, ambient.g, ambient.b, 1.0],
            light_pos,
            light_color,
        }
    }
}

// ── draw uniform ──────────────────────────────────────────────────────────

/// Per-mesh data: transforms and material parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    /// rgb = diffuse color, a = opacity.
    pub diffuse: [f32; 4],
    /// rgb = specular color, w = shininess.
    pub specular: [f32; 4],
}

impl DrawUniform {
    pub(super) fn new(object: &Object3D, material: Option<&Material>) -> Self {
        let model = object.matrix_world();
        let fallback;
        let material = match material {
            Some(m) => m,
            None => {
                fallback = Material::default();
                &fallback
            }
        };

        let Color { r, g, b, .. } = material.diffuse;
        let s = material.specular;

        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix(model).to_cols_array_2d(),
            diffuse: [r, g, b, material.opacity],
            specular: [s.r, s.g, s.b, material.shininess],
        }
    }
}

/// Inverse-transpose of the upper 3x3, widened back to a 4x4.
///
/// A singular model matrix (zero scale) yields identity.
pub(super) fn normal_matrix(model: Mat4) -> Mat4 {
    let m3 = glam::Mat3::from_mat4(model);
    if m3.determinant().abs() <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    Mat4::from_mat3(m3.inverse().transpose())
}

/// Opacity below one routes a mesh into the blended pass.
pub(super) fn is_transparent(material: Option<&Material>) -> bool {
    material.is_some_and(|m| m.opacity < 1.0)
}

/// Light position used for a camera-attached light.
#[inline]
pub(super) fn attached_light_position(camera: &PerspectiveCamera) -> Vec3 {
    camera.position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::scene::PointLight;

    fn mesh() -> Mesh {
        Mesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![],
            indices: vec![0, 1, 2],
            material: None,
        }
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn struct_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 160);
    }

    #[test]
    fn interleave_fills_missing_uvs() {
        let v = interleave(&mesh());
        assert_eq!(v.len(), 3);
        assert_eq!(v[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(v[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(v[2].uv, [0.0, 0.0]);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn frame_light_follows_camera() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        cam.position = Vec3::new(1.0, 2.0, 3.0);
        cam.add_light(PointLight::new(Color::WHITE, 15.0));
        let scene = Scene::new(Color::WHITE);

        let u = FrameUniform::new(&cam, &scene);
        let p = attached_light_position(&cam);
        assert_eq!(&u.light_pos[..3], &[p.x, p.y, p.z]);
        assert_eq!(u.light_color, [15.0, 15.0, 15.0, 2.0]);
        assert_eq!(u.camera_pos, [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn frame_without_light_is_dark() {
        let cam = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        let u = FrameUniform::new(&cam, &Scene::new(Color::BLACK));
        assert_eq!(u.light_color, [0.0; 4]);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_uniform_defaults_material() {
        let obj = Object3D::new("o");
        let u = DrawUniform::new(&obj, None);
        let d = Material::default();
        assert_eq!(u.diffuse[3], 1.0);
        assert_eq!(u.specular[3], d.shininess);
        assert_eq!(u.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn normal_matrix_undoes_uniform_scale() {
        let n = normal_matrix(Mat4::from_scale(Vec3::splat(0.01)));
        let v = n.transform_vector3(Vec3::Y);
        assert!((v - Vec3::Y * 100.0).length() < 1e-3);
    }

    #[test]
    fn normal_matrix_of_singular_model_is_identity() {
        assert_eq!(normal_matrix(Mat4::from_scale(Vec3::ZERO)), Mat4::IDENTITY);
    }

    #[test]
    fn transparency_from_opacity() {
        let mut m = Material::default();
        assert!(!is_transparent(Some(&m)));
        m.opacity = 0.5;
        assert!(is_transparent(Some(&m)));
        assert!(!is_transparent(None));
    }
}
