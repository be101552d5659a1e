//! Contracts between the viewer core and its host platform.
//!
//! A host (the bundled winit window, or an embedder) provides a
//! [`Viewport`]: observable dimensions, a per-frame callback
//! ([`FrameScheduler`]), resize notifications, and the ability to attach a
//! [`SceneRenderer`] to its drawing surface. The core never touches window
//! or GPU APIs directly.

use std::fmt;

use crate::camera::core::Camera;
use crate::error::VitrineError;
use crate::scene::Node;
use crate::session::rig::{LightingRig, Stage};

/// Handle for one scheduled per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    /// Wrap a host-assigned callback id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The host-assigned callback id.
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Handle for an active resize-notification subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(u64);

impl ResizeSubscription {
    /// Wrap a host-assigned subscription id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// The platform's per-frame presentation callback.
///
/// Each [`request_frame`](Self::request_frame) schedules exactly one
/// callback; the host later delivers the returned token back to the viewer
/// (see [`ViewerController::on_frame`](crate::ViewerController::on_frame)).
/// A cancelled token must never be delivered.
pub trait FrameScheduler {
    /// Schedule one frame callback.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a scheduled callback that has not fired yet.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// A rectangular drawing region owned by the host.
///
/// At most one session may be attached at a time; attaching an attached
/// viewport must fail with [`VitrineError::Attach`].
pub trait Viewport: FrameScheduler {
    /// Renderer type produced by [`attach`](Self::attach).
    type Renderer: SceneRenderer;

    /// Current size in logical pixels, or `None` if the region is not
    /// available (e.g. not yet laid out or already torn down).
    fn client_size(&self) -> Option<(u32, u32)>;

    /// Physical pixels per logical pixel.
    fn scale_factor(&self) -> f64;

    /// Bind a renderer to this viewport's surface at the given physical
    /// size.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Attach`] if the viewport is unavailable or
    /// already attached, or [`VitrineError::Gpu`] if GPU setup fails.
    fn attach(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Renderer, VitrineError>;

    /// Remove the renderer's output surface from this viewport.
    fn detach(&mut self);

    /// Start receiving dimension-change notifications.
    fn subscribe_resize(&mut self) -> ResizeSubscription;

    /// Stop receiving dimension-change notifications.
    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription);
}

/// Per-frame presentation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface is outdated or lost; reconfigure it and continue.
    SurfaceLost,
    /// The frame could not be acquired in time; drop it and continue.
    Skipped,
    /// The renderer cannot continue.
    Fatal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceLost => write!(f, "surface lost or outdated"),
            Self::Skipped => write!(f, "frame skipped"),
            Self::Fatal(msg) => write!(f, "fatal render error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Everything a renderer needs to draw one frame.
pub struct FrameView<'a> {
    /// Camera with an up-to-date projection.
    pub camera: &'a Camera,
    /// Fixed lighting rig.
    pub lights: &'a LightingRig,
    /// Ground and grid decoration.
    pub stage: &'a Stage,
    /// Normalized asset root, if one is loaded.
    pub asset: Option<&'a Node>,
    /// Changes whenever `asset` is replaced or cleared, so renderers can
    /// cache uploaded geometry.
    pub asset_revision: u64,
}

/// Draws [`FrameView`]s onto a viewport surface and owns the GPU
/// resources for it.
pub trait SceneRenderer {
    /// Current backing-surface size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Resize the backing surface. Zero dimensions are ignored.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw and present exactly one frame.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] describing whether the failure is
    /// recoverable.
    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError>;

    /// Release all GPU resources. Must tolerate repeated calls.
    fn release(&mut self);
}
