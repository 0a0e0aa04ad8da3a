//! GPU rendering subsystem.
//!
//! Renderers consume the scene and issue GPU commands via wgpu. Each renderer
//! owns its GPU resources (pipelines, buffers, textures) and creates them
//! lazily on first use.
//!
//! Convention:
//! - world space is right-handed, +Y up
//! - colors are linear; the sRGB surface encodes on store

mod ctx;
mod mesh;
mod common;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::MeshRenderer;
