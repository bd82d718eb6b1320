use glam::Vec3;

use crate::config::OrbitConfig;
use crate::controller::input::{InputEvent, MouseButton};
use crate::model::Camera;

/// Keep the polar angle this far from the poles so `look_at` stays stable.
const POLAR_EPSILON: f32 = 1e-3;
/// Radians of orbit per pixel of pointer travel at `rotate_speed == 1`.
const ROTATE_PER_PIXEL: f32 = 2.0 * std::f32::consts::PI / 1000.0;

/// Damped orbit around the camera target.
///
/// Gestures add to pending spherical deltas. Every [`OrbitControls::update`]
/// applies `damping_factor` of what is pending and keeps the rest, so the
/// camera glides to a stop instead of halting on pointer release.
pub struct OrbitControls {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    dragging: bool,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::from_config(&OrbitConfig::default())
    }

    pub fn from_config(config: &OrbitConfig) -> Self {
        Self {
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Feeds a pointer or wheel event. Returns true if it was consumed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { button: MouseButton::Left } => {
                self.dragging = true;
                true
            }
            InputEvent::PointerUp { button: MouseButton::Left } | InputEvent::FocusLost => {
                self.dragging = false;
                true
            }
            InputEvent::PointerMove { dx, dy } if self.dragging => {
                self.rotate(*dx, *dy);
                true
            }
            InputEvent::Wheel { delta_y } => {
                self.zoom(*delta_y);
                true
            }
            _ => false,
        }
    }

    /// Queues an orbit by a pointer movement in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_theta -= dx * ROTATE_PER_PIXEL * self.rotate_speed;
        self.pending_phi -= dy * ROTATE_PER_PIXEL * self.rotate_speed;
    }

    /// Queues a dolly. Positive `delta_y` (wheel down) moves away.
    pub fn zoom(&mut self, delta_y: f32) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = 0.95_f32.powf(self.zoom_speed);
        if delta_y > 0.0 {
            self.pending_scale /= step;
        } else {
            self.pending_scale *= step;
        }
    }

    /// Advances the damped state and moves the camera. Returns true if the
    /// camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.eye - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let k = self.damping_factor;
        theta += self.pending_theta * k;
        phi += self.pending_phi * k;
        phi = phi.clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        let scale = 1.0 + (self.pending_scale - 1.0) * k;
        let new_radius = (radius * scale).clamp(self.min_distance, self.max_distance);

        self.pending_theta *= 1.0 - k;
        self.pending_phi *= 1.0 - k;
        self.pending_scale = 1.0 + (self.pending_scale - 1.0) * (1.0 - k);

        let new_offset = Vec3::new(
            new_radius * phi.sin() * theta.sin(),
            new_radius * phi.cos(),
            new_radius * phi.sin() * theta.cos(),
        );
        let moved = (new_offset - offset).length_squared() > 1e-12;
        camera.eye = camera.target + new_offset;
        moved
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}
