//! Input handling: platform-agnostic events and the processor that turns
//! pointer gestures into orbit-control operations.

/// Platform-agnostic input events.
pub mod event;
/// Converts raw events into camera gestures.
pub mod processor;

pub use event::{CameraGesture, InputEvent, MouseButton};
pub use processor::InputProcessor;
