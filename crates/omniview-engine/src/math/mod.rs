//! 3D math shared by the scene and renderer.
//!
//! Vector and matrix types come from `glam`. World space is right-handed with
//! +Y up; cameras look down their local -Z.

mod aabb;

pub use aabb::Aabb;
pub use glam::{Mat3, Mat4, Quat, Vec3};
