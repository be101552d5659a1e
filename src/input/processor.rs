//! Converts raw platform events into camera gestures.
//!
//! The `InputProcessor` owns all transient pointer state (cursor
//! position, held buttons, modifier keys). Left drag orbits, right or
//! middle drag pans, shift + left drag pans, and the wheel zooms.

use glam::Vec2;

use super::event::{CameraGesture, InputEvent, MouseButton};

/// Converts raw window events into [`CameraGesture`]s.
#[derive(Debug, Default)]
pub struct InputProcessor {
    /// Last cursor position, `None` until the first move or after leaving.
    cursor: Option<Vec2>,
    left: bool,
    right: bool,
    middle: bool,
    shift: bool,
}

impl InputProcessor {
    /// Processor with no buttons held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any button that drives a drag is held.
    #[must_use]
    pub fn dragging(&self) -> bool {
        self.left || self.right || self.middle
    }

    /// Whether the shift modifier is held.
    #[must_use]
    pub fn shift_pressed(&self) -> bool {
        self.shift
    }

    /// Drop all held buttons, e.g. when the window loses focus.
    pub fn release_buttons(&mut self) {
        self.left = false;
        self.right = false;
        self.middle = false;
    }

    /// Process a raw input event and return zero or one gestures.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<CameraGesture> {
        match event {
            InputEvent::CursorMoved { x, y } => self.handle_cursor_moved(Vec2::new(x, y)),
            InputEvent::CursorLeft => {
                self.cursor = None;
                self.release_buttons();
                None
            }
            InputEvent::MouseButton { button, pressed } => {
                match button {
                    MouseButton::Left => self.left = pressed,
                    MouseButton::Right => self.right = pressed,
                    MouseButton::Middle => self.middle = pressed,
                }
                None
            }
            InputEvent::Scroll { delta } if delta != 0.0 => {
                Some(CameraGesture::Zoom { delta })
            }
            InputEvent::Scroll { .. } => None,
            InputEvent::ModifiersChanged { shift } => {
                self.shift = shift;
                None
            }
        }
    }

    fn handle_cursor_moved(&mut self, position: Vec2) -> Option<CameraGesture> {
        let previous = self.cursor.replace(position)?;
        let delta = position - previous;
        if delta == Vec2::ZERO || !self.dragging() {
            return None;
        }
        if self.right || self.middle || self.shift {
            Some(CameraGesture::Pan { delta })
        } else {
            Some(CameraGesture::Rotate { delta })
        }
    }
}
