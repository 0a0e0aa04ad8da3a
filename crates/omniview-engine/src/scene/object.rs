use std::path::PathBuf;

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::math::Aabb;
use crate::paint::Color;

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Surface description for one mesh (Phong model).
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
    pub opacity: f32,
    pub diffuse_map: Option<TextureImage>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Color::WHITE,
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
            opacity: 1.0,
            diffuse_map: None,
        }
    }
}

/// Indexed triangle mesh in object-local space.
///
/// `normals` and `uvs` are either empty or the same length as `positions`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Index into the owning object's `materials`.
    pub material: Option<usize>,
}

impl Mesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Replaces `normals` with area-weighted smooth vertex normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) =
                (self.positions.get(a), self.positions.get(b), self.positions.get(c))
            else {
                continue;
            };
            let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
            // Cross product length is twice the triangle area.
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }

        self.normals = acc
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Bounds of this mesh after applying `world`.
    pub fn bounds_in(&self, world: &Mat4) -> Aabb {
        Aabb::from_points(
            self.positions
                .iter()
                .map(|p| world.transform_point3(Vec3::from(*p))),
        )
    }
}

/// A loaded model: meshes, their materials, and a transform.
///
/// `rotation` is Euler XYZ in radians.
#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the same scale factor on all three axes.
    pub fn set_scalar_scale(&mut self, s: f32) {
        self.scale = Vec3::splat(s);
    }

    pub fn matrix_world(&self) -> Mat4 {
        let q = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, q, self.position)
    }

    /// Tight world-space bounds over every vertex of every mesh.
    pub fn world_bounds(&self) -> Aabb {
        let world = self.matrix_world();
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, m| acc.union(m.bounds_in(&world)))
    }

    /// Material bound to `mesh`, if the index resolves.
    pub fn material_for(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material.and_then(|i| self.materials.get(i))
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn unit_quad() -> Mesh {
        Mesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Mesh::default()
        }
    }

    // ── normals ───────────────────────────────────────────────────────────

    #[test]
    fn ccw_quad_normals_face_positive_z() {
        let mut m = unit_quad();
        m.compute_vertex_normals();
        assert_eq!(m.normals.len(), 4);
        for n in &m.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn unreferenced_vertex_gets_fallback_normal() {
        let mut m = unit_quad();
        m.positions.push([5.0, 5.0, 5.0]);
        m.compute_vertex_normals();
        assert_eq!(m.normals[4], [0.0, 1.0, 0.0]);
    }

    // ── transform / bounds ────────────────────────────────────────────────

    #[test]
    fn world_bounds_apply_offset_scale_and_rotation() {
        let mut obj = Object3D::new("wheel");
        obj.meshes.push(unit_quad());
        obj.position = Vec3::new(0.0, -0.95, 0.0);
        obj.set_scalar_scale(0.01);
        obj.rotation.z = PI;

        let b = obj.world_bounds();
        // Rotating by π about Z maps (x, y) -> (-x, -y).
        assert!((b.min.x - -0.01).abs() < 1e-6);
        assert!((b.max.x - 0.0).abs() < 1e-6);
        assert!((b.min.y - -0.96).abs() < 1e-6);
        assert!((b.max.y - -0.95).abs() < 1e-6);
        assert_eq!(b.size().z, 0.0);
    }

    #[test]
    fn object_without_meshes_has_empty_bounds() {
        assert!(Object3D::new("empty").world_bounds().is_empty());
    }

    #[test]
    fn material_lookup_tolerates_bad_index() {
        let mut obj = Object3D::new("o");
        obj.materials.push(Material::default());
        let mut m = unit_quad();
        m.material = Some(3);
        assert!(obj.material_for(&m).is_none());
        m.material = Some(0);
        assert!(obj.material_for(&m).is_some());
    }

    #[test]
    fn counts_sum_over_meshes() {
        let mut obj = Object3D::new("o");
        obj.meshes.push(unit_quad());
        obj.meshes.push(unit_quad());
        assert_eq!(obj.vertex_count(), 8);
        assert_eq!(obj.triangle_count(), 4);
    }
}
