//! WASD and mouse-look camera controller

use crate::core::camera::Camera;
use crate::core::input::InputState;
use crate::core::types::Vec3;
use winit::keyboard::KeyCode;

/// Pitch stops just short of straight up/down so the horizontal basis in
/// [`Camera::right`] stays well conditioned.
const PITCH_LIMIT: f32 = 1.54;

/// Free-flying controller. Mouse look drives the camera's yaw and pitch
/// directly; WASD moves along the view plane, Space and Q move vertically,
/// Shift sprints.
pub struct FlyCameraController {
    /// Movement speed in units per second
    pub speed: f32,
    /// Radians of rotation per raw mouse count (scaled by 1e-3)
    pub sensitivity: f32,
}

impl FlyCameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self { speed, sensitivity }
    }

    /// Apply one frame of input to the camera
    pub fn update(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        if input.is_mouse_captured() {
            let (dx, dy) = input.look_delta();
            camera.yaw -= dx * self.sensitivity * 0.001;
            camera.pitch =
                (camera.pitch - dy * self.sensitivity * 0.001).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        let forward = camera.forward();
        let right = camera.right();
        let mut wish = Vec3::ZERO;

        if input.is_key_pressed(KeyCode::KeyW) {
            wish += forward;
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            wish -= forward;
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            wish -= right;
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            wish += right;
        }
        if input.is_key_pressed(KeyCode::Space) {
            wish.y += 1.0;
        }
        if input.is_key_pressed(KeyCode::KeyQ) {
            wish.y -= 1.0;
        }

        if wish.length_squared() > 0.0 {
            let sprint = if input.is_key_pressed(KeyCode::ShiftLeft) {
                3.0
            } else {
                1.0
            };
            camera.position += wish.normalize() * self.speed * sprint * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_clamped_at_the_poles() {
        let controller = FlyCameraController::new(4.0, 2.0);
        let mut camera = Camera::default();
        let mut input = InputState::new();
        input.set_mouse_captured(true);
        input.process_mouse_motion((0.0, -1e9));

        controller.update(&mut camera, &input, 1.0 / 60.0);
        assert!(camera.pitch <= PITCH_LIMIT);
        assert!(camera.forward().y > 0.99);
    }

    #[test]
    fn test_look_ignored_while_cursor_free() {
        let controller = FlyCameraController::new(4.0, 2.0);
        let mut camera = Camera::default();
        let input = InputState::new();

        controller.update(&mut camera, &input, 1.0 / 60.0);
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.position, Camera::default().position);
    }
}
