//! Omniview engine crate.
//!
//! This crate owns the platform + GPU runtime pieces and the small 3D scene
//! layer (camera, lights, orbit controls, model loading) used by the viewer.

pub mod device;
pub mod window;
pub mod input;
pub mod core;

pub mod logging;
pub mod math;
pub mod paint;
pub mod scene;
pub mod assets;
pub mod render;
