use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera looking at a target point.
///
/// The projection matrix is cached: after changing `aspect`, `fov_y`,
/// `z_near` or `z_far`, call [`Camera::update_projection`] before rendering.
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
    projection: Mat4,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            eye: Vec3::new(-3.0, 3.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: aspect_of(width, height),
            z_near: 0.1,
            z_far: 100.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self::new(width, height);
        camera.eye = Vec3::from_array(config.position);
        camera.target = Vec3::from_array(config.target);
        camera.fov_y = config.fov_y_degrees.to_radians();
        camera.z_near = config.z_near;
        camera.z_far = config.z_far;
        camera.update_projection();
        camera
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// Sets the aspect ratio from a surface size. Zero-sized surfaces are
    /// ignored so the projection never divides by zero.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = aspect_of(width, height);
        }
    }

    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view()
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = Camera::new(800, 600);
        let before = camera.projection();
        camera.set_aspect(1600, 600);
        assert_eq!(camera.projection(), before);
        camera.update_projection();
        assert_ne!(camera.projection(), before);
    }

    #[test]
    fn test_zero_size_keeps_aspect() {
        let mut camera = Camera::new(800, 600);
        camera.set_aspect(0, 600);
        assert_eq!(camera.aspect, 800.0 / 600.0);
        camera.set_aspect(800, 0);
        assert_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_from_config_looks_at_target() {
        let camera = Camera::from_config(&CameraConfig::default(), 800, 600);
        assert_eq!(camera.eye, Vec3::new(-3.0, 3.0, 3.0));
        let f = camera.forward();
        assert!((f - (-camera.eye).normalize()).length() < 1e-6);
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
    }
}
