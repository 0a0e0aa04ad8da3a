//! Scene layer: camera, lights, loaded objects, framing and orbit controls.
//!
//! Everything here is CPU-side and GPU-agnostic; `render` consumes it.

mod camera;
mod framing;
mod graph;
mod light;
mod object;
mod orbit;

pub use camera::PerspectiveCamera;
pub use framing::{fit_camera_to_object, fit_camera_to_object_default, fitting_distance, WorldBounds, DEFAULT_FIT_MARGIN};
pub use graph::Scene;
pub use light::{AmbientLight, PointLight};
pub use object::{Material, Mesh, Object3D, TextureImage};
pub use orbit::{OrbitConfig, OrbitControls};
