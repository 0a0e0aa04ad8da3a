//! Model assets: MTL material libraries, OBJ geometry, diffuse textures.
//!
//! Parsing is delegated to `tobj` and image decoding to `image`; this module
//! turns their output into scene types and runs the load off the main thread.

mod loader;
mod mtl;
mod obj;
mod progress;
mod texture;

pub use loader::{load_model, spawn_model_load, ModelRequest, PendingModel};
pub use mtl::{load_materials, MaterialLibrary};
pub use obj::load_object;
pub use progress::ProgressReader;
pub use texture::load_texture;
