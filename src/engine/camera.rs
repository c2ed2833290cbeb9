// Orbit camera for inspecting a glow quad from every side.
//
// Camera model:
//   - A fixed "target" point the camera looks at
//   - Yaw around world Y, pitch above/below the horizon (clamped short of the poles)
//   - Zoom by adjusting distance along the look vector
//   - Left mouse drag or arrow keys orbit, mouse wheel zooms

use glam::{Mat4, Vec3};
use super::glow_quad::ViewerSource;
use super::input::InputState;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

const PITCH_LIMIT: f32 = 85.0 * std::f32::consts::PI / 180.0;

pub struct OrbitCamera {
    pub target: Vec3,

    /// Distance from target along the look direction.
    /// Private: always clamped to [min_distance, max_distance] in update(). Use distance() to read.
    distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    /// Elevation angle in radians (0 = horizontal, positive = above the target)
    pub pitch: f32,

    /// Horizontal rotation in radians (0 = camera on the +Z side of the target)
    pub yaw: f32,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,

    /// Arrow-key orbit speed in radians per second
    pub orbit_speed: f32,

    /// Radians of orbit per pixel of mouse drag
    pub drag_sensitivity: f32,

    /// Zoom change (in distance units) per scroll line
    pub zoom_speed: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 400.0,
            min_distance: 60.0,
            max_distance: 2000.0,
            pitch: 20.0_f32.to_radians(),
            yaw: 0.0,
            fov: 45.0_f32.to_radians(),
            near: 1.0,
            far: 10_000.0,
            orbit_speed: 1.2,
            drag_sensitivity: 0.01,
            zoom_speed: 40.0,
        }
    }

    /// Update orbit angles and zoom from input. Call once per frame before rendering.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        if input.is_key_held(KeyCode::ArrowLeft)  { self.yaw -= self.orbit_speed * dt; }
        if input.is_key_held(KeyCode::ArrowRight) { self.yaw += self.orbit_speed * dt; }
        if input.is_key_held(KeyCode::ArrowUp)    { self.pitch += self.orbit_speed * dt; }
        if input.is_key_held(KeyCode::ArrowDown)  { self.pitch -= self.orbit_speed * dt; }

        if input.is_button_held(MouseButton::Left) {
            let (dx, dy) = input.mouse_delta;
            self.yaw -= dx * self.drag_sensitivity;
            self.pitch += dy * self.drag_sensitivity;
        }

        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        // Zoom: scroll up (positive delta) zooms in (decreases distance)
        self.distance -= input.scroll_delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    /// World-space position of the camera eye.
    pub fn camera_position(&self) -> Vec3 {
        self.target + self.eye_offset()
    }

    /// View matrix: looks from the camera eye toward the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera_position(), self.target, Vec3::Y)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn distance(&self) -> f32 { self.distance }

    // Offset from target to camera eye based on pitch, yaw, and distance.
    fn eye_offset(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos() * self.distance,
            self.pitch.sin() * self.distance,
            self.yaw.cos() * self.pitch.cos() * self.distance,
        )
    }
}

impl ViewerSource for OrbitCamera {
    fn viewer_location(&self) -> Option<Vec3> {
        Some(self.camera_position())
    }
}
