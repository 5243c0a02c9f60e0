//! Keyboard and mouse state assembled from winit events

use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame input snapshot.
///
/// Window and device events accumulate into it as they arrive; the frame
/// driver reads it during the redraw and calls [`end_frame`](Self::end_frame)
/// once per frame.
#[derive(Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed_this_frame: HashSet<KeyCode>,
    /// Raw mouse counts accumulated while captured
    look_delta: (f32, f32),
    mouse_captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat,
                    ..
                },
            ..
        } = event
        {
            self.handle_key(*code, *state, *repeat);
        }
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if !repeat && self.held.insert(code) {
                    self.pressed_this_frame.insert(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    /// Process raw mouse motion from a device event. Ignored while the cursor
    /// is free so the view does not spin when the user mouses over the window.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.mouse_captured {
            self.look_delta.0 += delta.0 as f32;
            self.look_delta.1 += delta.1 as f32;
        }
    }

    /// Reset per-frame state; call once at the end of each frame
    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.look_delta = (0.0, 0.0);
    }

    /// True while the key is held down
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True only on the frame the key went down
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    /// Mouse counts accumulated this frame
    pub fn look_delta(&self) -> (f32, f32) {
        self.look_delta
    }

    /// Set cursor capture state; any pending motion is discarded so the
    /// capture click itself does not jerk the view
    pub fn set_mouse_captured(&mut self, captured: bool) {
        self.mouse_captured = captured;
        self.look_delta = (0.0, 0.0);
    }

    pub fn is_mouse_captured(&self) -> bool {
        self.mouse_captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed, false);

        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.end_frame();
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.handle_key(KeyCode::KeyW, ElementState::Released, false);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_key_repeat_does_not_retrigger() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyR, ElementState::Pressed, false);
        input.end_frame();
        input.handle_key(KeyCode::KeyR, ElementState::Pressed, true);
        assert!(!input.is_key_just_pressed(KeyCode::KeyR));
    }

    #[test]
    fn test_mouse_motion_gated_on_capture() {
        let mut input = InputState::new();
        input.process_mouse_motion((4.0, -2.0));
        assert_eq!(input.look_delta(), (0.0, 0.0));

        input.set_mouse_captured(true);
        input.process_mouse_motion((4.0, -2.0));
        input.process_mouse_motion((1.0, 1.0));
        assert_eq!(input.look_delta(), (5.0, -1.0));

        input.end_frame();
        assert_eq!(input.look_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_releasing_capture_discards_pending_motion() {
        let mut input = InputState::new();
        input.set_mouse_captured(true);
        input.process_mouse_motion((10.0, 10.0));
        input.set_mouse_captured(false);
        assert_eq!(input.look_delta(), (0.0, 0.0));
    }
}
