//! Orbit controls.
//!
//! Rotates the camera around a target on a sphere, dollies the radius and
//! pans the target in the camera plane. Input is accumulated as deltas and
//! applied in [`OrbitControls::update`], which also enforces the distance
//! and polar-angle bounds.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::input::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

use super::camera::PerspectiveCamera;

/// Keeps φ strictly inside (0, π) so the view basis never degenerates.
const POLAR_EPS: f32 = 1e-6;

/// Base dolly factor per wheel line (before `zoom_speed`).
const ZOOM_BASE: f32 = 0.95;

/// Orbit limits and input sensitivity.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitConfig {
    pub min_distance: f32,
    pub max_distance: f32,

    /// Polar angle bounds in radians; 0 looks down from +Y, π from -Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DragMode {
    Rotate,
    Dolly,
    Pan,
}

/// Spherical coordinates, Y-up: θ around +Y from +Z, φ down from +Y.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

/// Pointer-driven orbit camera controller.
///
/// Left drag rotates (with a modifier held it pans), middle drag dollies,
/// right drag pans, the wheel dollies.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub config: OrbitConfig,
    pub target: Vec3,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,

    drag: Option<DragMode>,
    last_pointer: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            target: Vec3::ZERO,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            drag: None,
            last_pointer: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current camera distance to the target.
    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        camera.position.distance(self.target)
    }

    /// Current polar angle of the camera around the target.
    pub fn polar_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_offset(camera.position - self.target).phi
    }

    /// Current azimuth of the camera around the target.
    pub fn azimuth_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_offset(camera.position - self.target).theta
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Moves the camera closer: radius is multiplied by `factor` (< 1).
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Moves the camera away: radius is divided by `factor` (< 1).
    pub fn dolly_out(&mut self, factor: f32) {
        self.scale /= factor;
    }

    /// Pans by a screen-space delta in pixels.
    ///
    /// Scaled so the point under the cursor at the target's depth follows
    /// the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let target_distance =
            (camera.position - self.target).length() * (camera.fov_radians() / 2.0).tan();

        let left = 2.0 * dx * target_distance / viewport_height;
        let up = 2.0 * dy * target_distance / viewport_height;

        self.pan_offset += camera.right() * -left + camera.local_up() * up;
    }

    fn zoom_factor(&self, lines: f32) -> f32 {
        ZOOM_BASE.powf(self.config.zoom_speed * lines.abs())
    }

    fn drag_mode_for(&self, ev: &PointerButtonEvent) -> Option<DragMode> {
        let mode = match ev.button {
            MouseButton::Left if ev.modifiers.any() => DragMode::Pan,
            MouseButton::Left => DragMode::Rotate,
            MouseButton::Middle => DragMode::Dolly,
            MouseButton::Right => DragMode::Pan,
            _ => return None,
        };
        let enabled = match mode {
            DragMode::Rotate => self.config.enable_rotate,
            DragMode::Dolly => self.config.enable_zoom,
            DragMode::Pan => self.config.enable_pan,
        };
        enabled.then_some(mode)
    }

    /// Feeds one input event. Takes effect on the next [`update`](Self::update).
    pub fn handle_event(&mut self, ev: &InputEvent, camera: &PerspectiveCamera, viewport_height: f32) {
        match ev {
            InputEvent::PointerButton(b) if b.state == MouseButtonState::Pressed => {
                if let Some(mode) = self.drag_mode_for(b) {
                    self.drag = Some(mode);
                    self.last_pointer = Some(Vec2::new(b.x, b.y));
                }
            }

            InputEvent::PointerButton(_) | InputEvent::Focused(false) => {
                self.drag = None;
                self.last_pointer = None;
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                let p = Vec2::new(*x, *y);
                let (Some(mode), Some(last)) = (self.drag, self.last_pointer) else {
                    return;
                };
                self.last_pointer = Some(p);
                if viewport_height <= 0.0 {
                    return;
                }

                let d = p - last;
                match mode {
                    DragMode::Rotate => {
                        let d = d * self.config.rotate_speed;
                        self.rotate_left(TAU * d.x / viewport_height);
                        self.rotate_up(TAU * d.y / viewport_height);
                    }
                    DragMode::Dolly => {
                        let lines = d.y / crate::input::MouseWheelDelta::PIXELS_PER_LINE;
                        if lines > 0.0 {
                            self.dolly_out(self.zoom_factor(lines));
                        } else if lines < 0.0 {
                            self.dolly_in(self.zoom_factor(lines));
                        }
                    }
                    DragMode::Pan => {
                        let d = d * self.config.pan_speed;
                        self.pan(d.x, d.y, camera, viewport_height);
                    }
                }
            }

            InputEvent::MouseWheel { delta, .. } if self.config.enable_zoom => {
                let lines = delta.lines_y();
                if lines > 0.0 {
                    self.dolly_in(self.zoom_factor(lines));
                } else if lines < 0.0 {
                    self.dolly_out(self.zoom_factor(lines));
                }
            }

            _ => {}
        }
    }

    pub fn handle_events<'a, I>(&mut self, events: I, camera: &PerspectiveCamera, viewport_height: f32)
    where
        I: IntoIterator<Item = &'a InputEvent>,
    {
        for ev in events {
            self.handle_event(ev, camera, viewport_height);
        }
    }

    /// Applies pending deltas and bounds to `camera`, then points it at the
    /// target. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut s = Spherical::from_offset(camera.position - self.target);

        s.theta += self.delta_theta;
        s.phi += self.delta_phi;

        s.phi = s
            .phi
            .max(self.config.min_polar_angle)
            .min(self.config.max_polar_angle)
            .max(POLAR_EPS)
            .min(PI - POLAR_EPS);

        s.radius = (s.radius * self.scale)
            .max(self.config.min_distance)
            .min(self.config.max_distance);

        self.target += self.pan_offset;

        camera.position = self.target + s.to_offset();
        camera.look_at(self.target);

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;

        before.distance_squared(camera.position) > 1e-12
    }
}
