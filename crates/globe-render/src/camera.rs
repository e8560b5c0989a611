//! Perspective camera and the orbit rig that positions it around the planet.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera data uploaded once per frame.
///
/// Layout matches `struct Camera` in every shell shader:
/// view-projection, view, then world-space eye position.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub position: [f32; 4],
}

/// A look-at perspective camera with reverse-Z projection.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection with near and far swapped so the near plane lands on z=1.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio; zero-height windows are ignored.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 && width > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            view: self.view_matrix().to_cols_array_2d(),
            position: self.position.extend(1.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 30.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Spherical rig orbiting a fixed target.
///
/// `azimuth` turns around +Y, `polar` is measured from +Y. Azimuth 0 with
/// polar pi/2 places the eye on +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
}

impl OrbitCamera {
    /// Keeps the eye off the poles so look-at never degenerates.
    pub const POLAR_EPSILON: f32 = 1e-3;

    /// Rig on the +Z axis at `distance` from the origin.
    pub fn new(distance: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance,
            azimuth: 0.0,
            polar: std::f32::consts::FRAC_PI_2,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    /// Rotate by the given angles, clamping the polar angle short of the poles.
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.azimuth += d_azimuth;
        self.polar = (self.polar + d_polar).clamp(
            Self::POLAR_EPSILON,
            std::f32::consts::PI - Self::POLAR_EPSILON,
        );
    }

    pub fn apply_to(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
    }

    #[test]
    fn test_reverse_z_near_maps_to_one() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();
        let near = proj * Vec4::new(0.0, 0.0, -camera.near, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -camera.far, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-4);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::default();
        let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 0.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
        camera.set_aspect_ratio(1000.0, 500.0);
        assert!((camera.aspect_ratio - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_default_eye_on_positive_z() {
        let orbit = OrbitCamera::new(60.0);
        assert!((orbit.eye() - Vec3::new(0.0, 0.0, 60.0)).length() < 1e-4);
    }

    #[test]
    fn test_orbit_eye_keeps_distance() {
        let mut orbit = OrbitCamera::new(30.0);
        orbit.rotate(1.2, -0.4);
        assert!((orbit.eye().length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_polar_clamped() {
        let mut orbit = OrbitCamera::new(30.0);
        orbit.rotate(0.0, -10.0);
        assert!(orbit.polar >= OrbitCamera::POLAR_EPSILON);
        orbit.rotate(0.0, 20.0);
        assert!(orbit.polar <= PI - OrbitCamera::POLAR_EPSILON);
    }

    #[test]
    fn test_orbit_quarter_turn_moves_to_positive_x() {
        let mut orbit = OrbitCamera::new(10.0);
        orbit.rotate(FRAC_PI_2, 0.0);
        assert!((orbit.eye() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_apply_sets_camera_position() {
        let orbit = OrbitCamera::new(45.0);
        let mut camera = Camera::default();
        orbit.apply_to(&mut camera);
        assert!((camera.position.z - 45.0).abs() < 1e-4);
        let uniform = camera.to_uniform();
        assert!((uniform.position[2] - 45.0).abs() < 1e-4);
        assert_eq!(uniform.position[3], 1.0);
    }
}
