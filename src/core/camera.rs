//! Perspective fly camera

use crate::core::types::{Mat4, Vec3};

/// Camera with a yaw/pitch orientation; the view never rolls.
///
/// Yaw rotates around world +Y, pitch around the local X axis. Zero yaw and
/// pitch looks down -Z.
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation around world +Y, radians
    pub yaw: f32,
    /// Rotation around the local X axis, radians; the controller keeps it
    /// short of the poles
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a camera looking down -Z
    pub fn new(position: Vec3, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Create a camera oriented towards a target point
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self::new(position, 60.0, 16.0 / 9.0);
        let dir = (target - position).normalize_or_zero();
        camera.yaw = (-dir.x).atan2(-dir.z);
        camera.pitch = dir.y.clamp(-1.0, 1.0).asin();
        camera
    }

    /// View matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    /// Projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// World-space view direction
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// World-space right direction, always horizontal
    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, -sin_yaw)
    }

    /// Update aspect ratio (call on window resize)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), 60.0, 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_orientation_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_look_at_faces_target() {
        let camera = Camera::look_at(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO);
        let to_target = (Vec3::ZERO - camera.position).normalize();
        assert!((camera.forward() - to_target).length() < 1e-5);
    }

    #[test]
    fn test_view_matrix_centers_the_target() {
        let camera = Camera::look_at(Vec3::new(3.0, 1.0, 7.0), Vec3::ZERO);
        let in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        // The target lands on the view-space -Z axis
        assert!(in_view.x.abs() < 1e-4);
        assert!(in_view.y.abs() < 1e-4);
        assert!(in_view.z < 0.0);
    }

    #[test]
    fn test_right_stays_horizontal_under_pitch() {
        let mut camera = Camera::default();
        camera.yaw = 1.2;
        camera.pitch = -0.9;
        assert_eq!(camera.right().y, 0.0);
    }
}
