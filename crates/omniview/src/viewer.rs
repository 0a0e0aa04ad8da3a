use anyhow::Result;
use glam::Vec3;
use winit::dpi::PhysicalSize;

use omniview_engine::assets::{spawn_model_load, PendingModel};
use omniview_engine::core::{App, AppControl, FrameCtx};
use omniview_engine::device::RenderSurface;
use omniview_engine::input::{InputFrame, Key};
use omniview_engine::paint::Color;
use omniview_engine::render::MeshRenderer;
use omniview_engine::scene::{
    fit_camera_to_object, AmbientLight, Object3D, OrbitControls, PerspectiveCamera, PointLight,
    Scene,
};
use omniview_engine::window::CursorIcon;

use crate::config::{ModelPlacement, ViewerConfig};

/// Camera, scene, orbit controls and the size of the surface they render to.
pub struct ViewportState {
    pub camera: PerspectiveCamera,
    pub scene: Scene,
    pub controls: OrbitControls,
    pub surface_size: PhysicalSize<u32>,
}

impl ViewportState {
    pub fn new(config: &ViewerConfig) -> Self {
        let mut camera = PerspectiveCamera::new(config.fov, config.aspect, config.near, config.far);
        camera.position = config.camera_position;
        camera.add_light(PointLight::new(Color::WHITE, config.light_intensity));

        let mut scene = Scene::new(config.background);
        scene.ambient = AmbientLight::new(Color::WHITE, config.ambient_intensity);

        let mut controls = OrbitControls::new(config.orbit.clone());
        controls.update(&mut camera);

        Self {
            camera,
            scene,
            controls,
            surface_size: PhysicalSize::new(0, 0),
        }
    }

    /// Places a freshly loaded model and frames the camera on it.
    ///
    /// Returns the bounding-box center, which becomes the orbit target.
    pub fn on_model_loaded(&mut self, mut object: Object3D, placement: &ModelPlacement) -> Vec3 {
        object.position = placement.position;
        object.rotation = placement.rotation;
        object.set_scalar_scale(placement.scale);
        self.scene.add(object);

        let center = self.reframe(placement).unwrap_or(Vec3::ZERO);
        log::info!(
            "framed model at {center:?}, orbit distance {:.3}",
            self.controls.distance(&self.camera)
        );
        center
    }

    /// Fits the camera to the most recently added object and orbits around its
    /// center. `None` while the scene is empty.
    pub fn reframe(&mut self, placement: &ModelPlacement) -> Option<Vec3> {
        let object = self.scene.objects().last()?;
        let center = object.world_bounds().center();
        fit_camera_to_object(
            &mut self.camera,
            object,
            placement.view_direction,
            placement.fit_margin,
        );

        self.controls.target = center;
        self.controls.update(&mut self.camera);
        Some(center)
    }

    /// Escape asks to exit; Home re-frames the loaded model.
    pub fn handle_keys(&mut self, frame: &InputFrame, placement: &ModelPlacement) -> AppControl {
        if frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }
        if frame.key_pressed(Key::Home) {
            self.reframe(placement);
        }
        AppControl::Continue
    }

    /// Brings the surface to `size` and matches the camera aspect to it.
    ///
    /// A zero-height size (minimized window) only updates the surface; the
    /// aspect keeps its last finite value.
    pub fn on_resize(&mut self, surface: &mut dyn RenderSurface, size: PhysicalSize<u32>) {
        surface.set_size(size);
        self.surface_size = surface.size();

        if size.width == 0 || size.height == 0 {
            return;
        }
        self.camera.aspect = size.width as f32 / size.height as f32;
        self.camera.update_projection_matrix();
    }
}

/// The Omni-Wheel viewer application.
pub struct Viewer {
    config: ViewerConfig,
    state: ViewportState,
    pending: Option<PendingModel>,
    renderer: MeshRenderer,
}

impl Viewer {
    /// Builds the initial viewport and starts loading the model in the background.
    pub fn initialize(config: ViewerConfig) -> Result<Self> {
        let request = config.model_request();
        log::info!(
            "loading {} then {} from {}",
            request.material_file,
            request.geometry_file,
            request.dir.display()
        );

        let pending = spawn_model_load(request)?;
        let state = ViewportState::new(&config);

        Ok(Self {
            config,
            state,
            pending: Some(pending),
            renderer: MeshRenderer::new(),
        })
    }

    fn poll_model(&mut self) {
        let Some(pending) = self.pending.as_mut() else { return };
        let Some(result) = pending.poll() else { return };
        self.pending = None;

        match result {
            Ok(object) => {
                self.state.on_model_loaded(object, &self.config.placement);
            }
            Err(e) => log::error!("model failed to load: {e:#}"),
        }
    }
}

impl App for Viewer {
    fn on_resize(&mut self, surface: &mut dyn RenderSurface, size: PhysicalSize<u32>) {
        self.state.on_resize(surface, size);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.state.handle_keys(ctx.input_frame, &self.config.placement) == AppControl::Exit {
            return AppControl::Exit;
        }

        self.poll_model();

        let state = &mut self.state;
        let height = state.surface_size.height as f32;
        state
            .controls
            .handle_events(&ctx.input_frame.events, &state.camera, height);
        state.controls.update(&mut state.camera);

        ctx.window.set_cursor(if state.controls.is_dragging() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Default
        });

        let renderer = &mut self.renderer;
        let scene = &state.scene;
        let camera = &state.camera;
        ctx.render(|rctx, target| renderer.render(rctx, target, scene, camera))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use omniview_engine::input::{InputEvent, InputState, KeyState, Modifiers};
    use omniview_engine::scene::Mesh;

    struct FakeSurface {
        size: PhysicalSize<u32>,
        resizes: usize,
    }

    impl FakeSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: PhysicalSize::new(width, height),
                resizes: 0,
            }
        }
    }

    impl RenderSurface for FakeSurface {
        fn size(&self) -> PhysicalSize<u32> {
            self.size
        }

        fn set_size(&mut self, size: PhysicalSize<u32>) {
            self.size = size;
            self.resizes += 1;
        }
    }

    /// Axis-aligned box spanning `min..max`, as eight corners and twelve triangles.
    fn box_object(min: Vec3, max: Vec3) -> Object3D {
        let mut positions = Vec::new();
        for i in 0..8 {
            positions.push([
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            ]);
        }
        let indices = vec![
            0, 1, 3, 0, 3, 2, 4, 6, 7, 4, 7, 5, 0, 4, 5, 0, 5, 1, 2, 3, 7, 2, 7, 6, 0, 2, 6, 0,
            6, 4, 1, 5, 7, 1, 7, 3,
        ];
        let mut mesh = Mesh {
            name: "box".into(),
            positions,
            normals: vec![],
            uvs: vec![],
            indices,
            material: None,
        };
        mesh.compute_vertex_normals();

        let mut obj = Object3D::new("box");
        obj.meshes.push(mesh);
        obj
    }

    /// Input frame holding a single press of `key`.
    fn pressed(key: Key) -> InputFrame {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(
            &mut frame,
            InputEvent::Key {
                key,
                state: KeyState::Pressed,
                modifiers: Modifiers::default(),
                repeat: false,
            },
        );
        frame
    }

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    // ── initial state ─────────────────────────────────────────────────────

    #[test]
    fn initial_viewport_matches_config() {
        let config = ViewerConfig::default();
        let state = ViewportState::new(&config);

        assert_eq!(state.camera.fov, 2.0);
        assert_eq!(state.camera.aspect, 1.0);
        assert_eq!(state.camera.near, 0.1);
        assert_eq!(state.camera.far, 1000.0);
        assert!((state.camera.position - Vec3::new(0.0, 0.0, 2.5)).length() < 1e-5);
        assert_eq!(state.camera.target(), Vec3::ZERO);

        assert_eq!(state.scene.background, Color::WHITE);
        assert_eq!(state.scene.ambient.intensity, 1.0);
        assert!(state.scene.is_empty());

        let lights = state.camera.lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].intensity, 15.0);
        assert_eq!(lights[0].decay, 2.0);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_tracks_container() {
        let mut state = ViewportState::new(&ViewerConfig::default());
        let mut surface = FakeSurface::new(1, 1);

        state.on_resize(&mut surface, PhysicalSize::new(800, 600));
        assert!(approx(state.camera.aspect, 800.0 / 600.0, 1e-6));
        assert_eq!(surface.size, PhysicalSize::new(800, 600));

        state.on_resize(&mut surface, PhysicalSize::new(400, 400));
        assert_eq!(state.camera.aspect, 1.0);
        assert_eq!(surface.size, PhysicalSize::new(400, 400));
        assert_eq!(state.surface_size, PhysicalSize::new(400, 400));
        assert_eq!(surface.resizes, 2);

        let expected = Mat4::perspective_rh(2.0_f32.to_radians(), 1.0, 0.1, 1000.0);
        assert!(state.camera.projection_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn every_resize_is_applied() {
        let mut state = ViewportState::new(&ViewerConfig::default());
        let mut surface = FakeSurface::new(1, 1);

        for w in [640, 641, 642, 643] {
            state.on_resize(&mut surface, PhysicalSize::new(w, 480));
        }
        assert_eq!(surface.resizes, 4);
        assert!(approx(state.camera.aspect, 643.0 / 480.0, 1e-6));
    }

    #[test]
    fn zero_height_keeps_aspect() {
        let mut state = ViewportState::new(&ViewerConfig::default());
        let mut surface = FakeSurface::new(1, 1);

        state.on_resize(&mut surface, PhysicalSize::new(800, 600));
        state.on_resize(&mut surface, PhysicalSize::new(800, 0));

        assert_eq!(surface.size, PhysicalSize::new(800, 0));
        assert!(approx(state.camera.aspect, 800.0 / 600.0, 1e-6));
        assert!(state.camera.projection_matrix().is_finite());
    }

    // ── model arrival ─────────────────────────────────────────────────────

    #[test]
    fn load_targets_bounding_box_center() {
        let config = ViewerConfig::default();
        let mut state = ViewportState::new(&config);

        let obj = box_object(Vec3::new(-100.0, 0.0, -50.0), Vec3::new(100.0, 100.0, 50.0));
        let center = state.on_model_loaded(obj, &config.placement);

        let placed = state.scene.object(0).expect("object added");
        assert_eq!(placed.position, config.placement.position);
        assert_eq!(placed.scale, Vec3::splat(0.01));
        assert!(approx(placed.rotation.z, std::f32::consts::PI, 1e-6));

        assert!((center - placed.world_bounds().center()).length() < 1e-5);
        assert_eq!(state.controls.target, center);
        assert!((state.camera.target() - center).length() < 1e-5);
    }

    #[test]
    fn load_frames_along_view_direction() {
        let config = ViewerConfig::default();
        let mut state = ViewportState::new(&config);

        // 2x1x1 before the 0.01 scale, so the largest world extent is 0.02.
        let obj = box_object(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
        let center = state.on_model_loaded(obj, &config.placement);

        let expected = (0.01 / 1.0_f32.to_radians().tan()) * 2.0;
        let offset = state.camera.position - center;
        assert!(approx(offset.length(), expected, 1e-3));

        let dir = Vec3::new(0.0, -1.0, 1.0).normalize();
        assert!((offset.normalize() - dir).length() < 1e-4);
    }

    #[test]
    fn orbit_bounds_cap_fit_distance() {
        let mut config = ViewerConfig::default();
        config.placement.scale = 1.0;
        let mut state = ViewportState::new(&config);

        // Fit distance would be ~114.6; max orbit distance is 50.
        let obj = box_object(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
        let center = state.on_model_loaded(obj, &config.placement);

        assert!(approx(state.controls.distance(&state.camera), 50.0, 1e-3));
        assert_eq!(state.camera.target(), center);
    }

    #[test]
    fn reframe_restores_view_after_orbit() {
        let config = ViewerConfig::default();
        let mut state = ViewportState::new(&config);
        assert_eq!(state.reframe(&config.placement), None);

        let obj = box_object(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
        state.on_model_loaded(obj, &config.placement);
        let framed = state.camera.position;

        state.controls.rotate_left(1.0);
        state.controls.dolly_out(2.0);
        state.controls.update(&mut state.camera);
        assert!((state.camera.position - framed).length() > 1e-3);

        state.reframe(&config.placement);
        assert!((state.camera.position - framed).length() < 1e-4);
    }

    // ── keyboard ──────────────────────────────────────────────────────────

    #[test]
    fn escape_exits() {
        let config = ViewerConfig::default();
        let mut state = ViewportState::new(&config);
        assert_eq!(state.handle_keys(&pressed(Key::Escape), &config.placement), AppControl::Exit);
        assert_eq!(
            state.handle_keys(&InputFrame::default(), &config.placement),
            AppControl::Continue
        );
    }

    #[test]
    fn home_reframes_loaded_model() {
        let config = ViewerConfig::default();
        let mut state = ViewportState::new(&config);

        // Before any model arrives Home leaves the camera alone.
        let start = state.camera.position;
        assert_eq!(state.handle_keys(&pressed(Key::Home), &config.placement), AppControl::Continue);
        assert_eq!(state.camera.position, start);

        let obj = box_object(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
        state.on_model_loaded(obj, &config.placement);
        let framed = state.camera.position;

        state.controls.rotate_up(0.5);
        state.controls.update(&mut state.camera);
        assert!((state.camera.position - framed).length() > 1e-3);

        state.handle_keys(&pressed(Key::Home), &config.placement);
        assert!((state.camera.position - framed).length() < 1e-4);
    }
}
