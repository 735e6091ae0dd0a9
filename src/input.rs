//! Keyboard state for the current frame.
//!
//! The host feeds window events into a [`Keyboard`] and hands a shared
//! reference to the scene's `update`, so scenes query key state without any
//! global singleton.

use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Default, Clone)]
pub struct Keyboard {
    pressed: HashSet<KeyCode>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn press(&mut self, key: KeyCode) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.pressed.remove(&key);
    }

    /// Forget every held key, e.g. when the window loses focus and releases
    /// would never arrive.
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    /// Update the key state from a window event. Returns `true` if the event
    /// was keyboard related.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                match state {
                    ElementState::Pressed => self.press(*code),
                    ElementState::Released => self.release(*code),
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.clear();
                true
            }
            _ => false,
        }
    }
}
