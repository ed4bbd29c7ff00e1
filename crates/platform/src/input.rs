//! Keyboard input state.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Held keys plus per-frame press edges.
///
/// Feed it from `WindowEvent::KeyboardInput`, read it while updating the
/// frame, then call [`InputState::end_frame`] to clear the edges.
#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    just_pressed_keys: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the keys pressed since the previous frame.
    pub fn end_frame(&mut self) {
        self.just_pressed_keys.clear();
    }

    /// Records a key press. OS key repeat does not register a new edge.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Releases every key, e.g. when the window loses focus and release
    /// events would be missed.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.just_pressed_keys.clear();
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// `1.0` if only `positive` is held, `-1.0` if only `negative`, else 0.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_pressed(positive) {
            value += 1.0;
        }
        if self.is_key_pressed(negative) {
            value -= 1.0;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edge_cleared_at_end_of_frame() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyF);
        assert!(input.is_key_just_pressed(KeyCode::KeyF));
        assert!(input.is_key_pressed(KeyCode::KeyF));

        input.end_frame();
        assert!(!input.is_key_just_pressed(KeyCode::KeyF));
        assert!(input.is_key_pressed(KeyCode::KeyF));
    }

    #[test]
    fn test_repeat_does_not_retrigger() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::Space);
        input.end_frame();
        input.on_key_pressed(KeyCode::Space);
        assert!(!input.is_key_just_pressed(KeyCode::Space));
    }

    #[test]
    fn test_axis() {
        let mut input = InputState::new();
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 0.0);

        input.on_key_pressed(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 1.0);

        input.on_key_pressed(KeyCode::KeyS);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), 0.0);

        input.on_key_released(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyS, KeyCode::KeyW), -1.0);
    }

    #[test]
    fn test_release_all() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyA);
        input.release_all();
        assert!(!input.is_key_pressed(KeyCode::KeyA));
        assert!(!input.is_key_just_pressed(KeyCode::KeyA));
    }
}
