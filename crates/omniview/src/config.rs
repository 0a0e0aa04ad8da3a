use std::f32::consts::PI;
use std::path::PathBuf;

use glam::Vec3;
use omniview_engine::assets::ModelRequest;
use omniview_engine::paint::Color;
use omniview_engine::scene::OrbitConfig;
use omniview_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

/// Fixed transform applied to the model on arrival, and how the camera frames it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlacement {
    pub position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub scale: f32,
    /// Direction from the model's center to the camera. Need not be unit length.
    pub view_direction: Vec3,
    pub fit_margin: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -0.95, 0.0),
            rotation: Vec3::new(0.0, 0.0, PI),
            scale: 0.01,
            view_direction: Vec3::new(0.0, -1.0, 1.0),
            fit_margin: 2.0,
        }
    }
}

/// Every literal the viewer depends on.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub window_size: LogicalSize<f64>,

    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,

    pub background: Color,
    pub ambient_intensity: f32,
    pub light_intensity: f32,

    pub model_dir: PathBuf,
    pub material_file: String,
    pub geometry_file: String,
    pub placement: ModelPlacement,

    pub orbit: OrbitConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Omni-Wheel".to_string(),
            window_size: LogicalSize::new(800.0, 600.0),

            fov: 2.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            camera_position: Vec3::new(0.0, 0.0, 2.5),

            background: Color::WHITE,
            ambient_intensity: 1.0,
            light_intensity: 15.0,

            model_dir: PathBuf::from("models/obj"),
            material_file: "Omni-Wheel.mtl".to_string(),
            geometry_file: "Omni-Wheel.obj".to_string(),
            placement: ModelPlacement::default(),

            orbit: OrbitConfig {
                min_distance: 0.1,
                max_distance: 50.0,
                min_polar_angle: 0.0,
                max_polar_angle: PI,
                ..OrbitConfig::default()
            },
        }
    }
}

impl ViewerConfig {
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: self.window_size,
        }
    }

    pub fn model_request(&self) -> ModelRequest {
        ModelRequest::new(
            self.model_dir.clone(),
            self.material_file.clone(),
            self.geometry_file.clone(),
        )
    }
}
