//! Scene session: everything that lives while a viewport is attached.
//!
//! A [`SceneSession`] owns the renderer bound to the viewport, the camera
//! and its orbit controls, the fixed lighting rig and stage decoration,
//! the slot holding the current asset root and the render loop. It moves
//! from *Active* to *Disposed* exactly once.

/// Self-rescheduling frame task.
pub mod render_loop;
/// Viewport size tracking.
pub mod resize;
/// Lighting rig and stage decoration.
pub mod rig;

use glam::Vec3;

use self::render_loop::RenderLoop;
use self::resize::Dimensions;
use self::rig::{LightingRig, Stage};
use crate::camera::controller::OrbitControls;
use crate::camera::core::Camera;
use crate::camera::framing::{self, Framing};
use crate::error::VitrineError;
use crate::input::CameraGesture;
use crate::loader::LoadedAsset;
use crate::options::{CameraOptions, Options};
use crate::scene::normalize::{self, Normalization};
use crate::scene::Node;
use crate::viewport::{
    FrameScheduler, FrameToken, FrameView, RenderError, SceneRenderer, Viewport,
};

/// Lifecycle of a [`SceneSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Attached to a viewport and rendering.
    Active,
    /// Torn down; every operation is a no-op.
    Disposed,
}

/// Renderer, camera, lights, stage and asset slot for one attached
/// viewport.
pub struct SceneSession<R: SceneRenderer> {
    state: SessionState,
    renderer: R,
    camera: Camera,
    controls: OrbitControls,
    lights: LightingRig,
    stage: Stage,
    asset: Option<Node>,
    asset_revision: u64,
    framing: Option<Framing>,
    render_loop: RenderLoop,
    dimensions: Dimensions,
    camera_options: CameraOptions,
    canonical_size: f32,
}

impl<R: SceneRenderer> SceneSession<R> {
    /// Attach a new session to `viewport` and start its render loop.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Attach`] if the viewport reports no size or
    /// is already attached, or whatever the viewport's renderer setup
    /// fails with.
    pub fn attach<V>(viewport: &mut V, options: &Options) -> Result<Self, VitrineError>
    where
        V: Viewport<Renderer = R>,
    {
        let dimensions = Dimensions::measure(viewport, options.stage.fallback_height)
            .ok_or_else(|| VitrineError::Attach("viewport has no size".into()))?;
        let (pw, ph) = dimensions.physical;
        let renderer = viewport.attach(pw, ph)?;

        let (lw, lh) = dimensions.logical;
        let camera = Camera::new(lw as f32 / lh as f32, &options.camera);

        let mut session = Self {
            state: SessionState::Active,
            renderer,
            camera,
            controls: OrbitControls::new(&options.camera),
            lights: LightingRig::from_options(&options.lighting),
            stage: Stage::from_options(&options.stage),
            asset: None,
            asset_revision: 0,
            framing: None,
            render_loop: RenderLoop::new(),
            dimensions,
            camera_options: options.camera.clone(),
            canonical_size: options.stage.canonical_size,
        };
        let _ = session.render_loop.start(viewport);
        log::debug!("scene session attached at {lw}x{lh} (physical {pw}x{ph})");
        Ok(session)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is still attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The renderer bound to the viewport.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The scene camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The orbit controls driving the camera.
    #[must_use]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// The fixed lighting rig.
    #[must_use]
    pub fn lights(&self) -> &LightingRig {
        &self.lights
    }

    /// Ground and grid decoration.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The normalized asset root, if one is loaded.
    #[must_use]
    pub fn asset(&self) -> Option<&Node> {
        self.asset.as_ref()
    }

    /// Incremented every time the asset slot changes.
    #[must_use]
    pub fn asset_revision(&self) -> u64 {
        self.asset_revision
    }

    /// Camera placement computed for the current asset.
    #[must_use]
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// The render loop handle.
    #[must_use]
    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    /// Viewport size the camera and surface currently match.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Normalize `asset`, frame the camera on it and install it as the
    /// scene root, replacing any previous asset.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::DegenerateAsset`] if the asset cannot be
    /// normalized; the asset slot is cleared in that case while lights
    /// and stage stay in place.
    pub fn apply_asset(
        &mut self,
        asset: LoadedAsset,
    ) -> Result<Normalization, VitrineError> {
        if !self.is_active() {
            return Err(VitrineError::Attach("session is disposed".into()));
        }
        let LoadedAsset { url, mut root } = asset;
        let normalization = match normalize::normalize(&mut root, self.canonical_size) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("cannot normalize asset from {url}: {e}");
                self.clear_asset();
                return Err(e);
            }
        };

        let framing = framing::frame_normalized(&normalization, &self.camera_options);
        self.controls
            .reset(&mut self.camera, framing.eye, framing.target);
        let _ = self.controls.update(&mut self.camera);

        log::info!(
            "asset {url} ready: {} meshes, scale {:.4}, camera distance {:.2}",
            root.mesh_count(),
            normalization.scale,
            framing.distance,
        );
        self.asset = Some(root);
        self.framing = Some(framing);
        self.asset_revision += 1;
        Ok(normalization)
    }

    /// Remove the current asset, keeping lights and stage.
    pub fn clear_asset(&mut self) {
        if self.asset.take().is_some() {
            self.asset_revision += 1;
        }
        self.framing = None;
    }

    /// Make the camera aspect and renderer surface match `dimensions`.
    /// Camera position and orbit target are left alone. Returns `true` if
    /// anything changed.
    pub fn apply_dimensions(&mut self, dimensions: Dimensions) -> bool {
        if !self.is_active() {
            return false;
        }
        let mut changed = false;
        if dimensions.logical != self.dimensions.logical {
            let (w, h) = dimensions.logical;
            self.camera.set_aspect(w, h);
            changed = true;
        }
        if self.renderer.surface_size() != dimensions.physical {
            let (w, h) = dimensions.physical;
            self.renderer.resize(w, h);
            changed = true;
        }
        if changed {
            log::debug!(
                "session resized to {:?} (physical {:?})",
                dimensions.logical,
                dimensions.physical
            );
        }
        self.dimensions = dimensions;
        changed
    }

    /// Reconfigure the renderer surface at its current size after it was
    /// reported lost or outdated.
    pub fn recover_surface(&mut self) {
        if !self.is_active() {
            return;
        }
        let (w, h) = self.dimensions.physical;
        log::warn!("reconfiguring lost surface at {w}x{h}");
        self.renderer.resize(w, h);
    }

    /// Forward a camera gesture to the orbit controls.
    pub fn handle_gesture(&mut self, gesture: CameraGesture) {
        if !self.is_active() {
            return;
        }
        match gesture {
            CameraGesture::Rotate { delta } => self.controls.rotate(delta),
            CameraGesture::Pan { delta } => self.controls.pan(delta),
            CameraGesture::Zoom { delta } => self.controls.zoom(delta),
        }
    }

    /// Run one render-loop tick for the delivered `token`.
    ///
    /// Stale or cancelled tokens, and any token after disposal, are
    /// ignored and return `Ok(false)`. Otherwise one damping step is
    /// integrated, exactly one frame is presented and the next tick is
    /// scheduled. Returns `Ok(true)` when a frame was presented.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's [`RenderError`]. The loop keeps running
    /// after recoverable errors and stops after a fatal one.
    pub fn tick(
        &mut self,
        token: FrameToken,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<bool, RenderError> {
        if !self.is_active() {
            return Ok(false);
        }
        if !self.render_loop.accept(token) {
            log::trace!("ignoring stale frame token {}", token.id());
            return Ok(false);
        }

        let _ = self.controls.update(&mut self.camera);
        let frame = FrameView {
            camera: &self.camera,
            lights: &self.lights,
            stage: &self.stage,
            asset: self.asset.as_ref(),
            asset_revision: self.asset_revision,
        };
        let result = self.renderer.render(&frame);
        match &result {
            Err(RenderError::Fatal(msg)) => {
                log::error!("render loop stopped: {msg}");
            }
            _ => self.render_loop.reschedule(scheduler),
        }
        result.map(|()| true)
    }

    /// Tear the session down: stop the render loop, release the controls,
    /// release the renderer's GPU resources and detach from the viewport,
    /// in that order. Repeated calls are no-ops.
    pub fn dispose<V>(&mut self, viewport: &mut V)
    where
        V: Viewport<Renderer = R>,
    {
        if !self.is_active() {
            log::debug!("scene session already disposed");
            return;
        }
        self.render_loop.stop(viewport);
        self.controls.release();
        self.renderer.release();
        viewport.detach();
        self.asset = None;
        self.framing = None;
        self.state = SessionState::Disposed;
        log::debug!("scene session disposed");
    }

    /// Orbit target of the controls.
    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.controls.target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Mesh;
    use crate::testing::{box_node, FakeViewport, ViewportCall};

    fn loaded(root: Node) -> LoadedAsset {
        LoadedAsset {
            url: "test.glb".into(),
            root,
        }
    }

    #[test]
    fn attach_reads_viewport_size() {
        let mut viewport = FakeViewport::new(800, 600);
        viewport.scale = 2.0;
        let session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        assert!(session.is_active());
        assert_eq!(session.renderer().surface_size(), (1600, 1200));
        assert!((session.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(session.render_loop().is_running());
        assert_eq!(viewport.pending().len(), 1);
    }

    #[test]
    fn attach_with_zero_height_uses_fallback() {
        let mut viewport = FakeViewport::new(800, 0);
        let session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        assert_eq!(session.dimensions().logical, (800, 400));
        assert!((session.camera().aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn attach_fails_without_size_or_when_attached() {
        let mut viewport = FakeViewport::new(800, 600);
        viewport.size = None;
        let err = SceneSession::attach(&mut viewport, &Options::default());
        assert!(matches!(err, Err(VitrineError::Attach(_))));

        let mut viewport = FakeViewport::new(800, 600);
        let _first = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        let second = SceneSession::attach(&mut viewport, &Options::default());
        assert!(matches!(second, Err(VitrineError::Attach(_))));
    }

    #[test]
    fn apply_asset_frames_camera() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        let root = box_node(Vec3::new(-1.0, 2.0, -3.0), Vec3::new(3.0, 4.0, 1.0));
        let n = session.apply_asset(loaded(root)).unwrap();
        assert!((n.normalized_max_dim() - 30.0).abs() < 1e-4);

        let framing = session.framing().unwrap();
        assert!((framing.distance - 45.0).abs() < 1e-4);
        assert!((session.camera().eye - Vec3::new(45.0, 31.5, 45.0)).length() < 1e-2);
        assert!((session.target().y - 7.5).abs() < 1e-4);
        assert_eq!(session.asset_revision(), 1);

        let bounds = session.asset().unwrap().world_bounds();
        assert!(bounds.min.y.abs() < 1e-4);
        assert!(bounds.center().x.abs() < 1e-4);
        assert!(bounds.center().z.abs() < 1e-4);
    }

    #[test]
    fn degenerate_asset_clears_slot_but_keeps_stage() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        let root = box_node(Vec3::ZERO, Vec3::ONE);
        let _ = session.apply_asset(loaded(root)).unwrap();

        let point = Node::leaf(Mesh {
            positions: vec![[1.0, 1.0, 1.0]; 3],
            indices: vec![0, 1, 2],
            ..Mesh::default()
        });
        let err = session.apply_asset(loaded(point));
        assert!(matches!(err, Err(VitrineError::DegenerateAsset)));
        assert!(session.asset().is_none());
        assert!(session.framing().is_none());
        assert!(session.stage().grid.is_some());
        assert!(session.is_active());
    }

    #[test]
    fn tick_presents_one_frame_per_token() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        let token = viewport.take_pending()[0];
        assert_eq!(session.tick(token, &mut viewport), Ok(true));
        assert_eq!(session.tick(token, &mut viewport), Ok(false));
        assert_eq!(viewport.renders(), 1);
        assert_eq!(viewport.pending().len(), 1);
    }

    #[test]
    fn dispose_runs_in_order_and_is_idempotent() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        let pending = viewport.pending()[0];
        viewport.clear_journal();

        session.dispose(&mut viewport);
        assert_eq!(
            viewport.journal(),
            vec![
                ViewportCall::CancelFrame(pending),
                ViewportCall::RendererRelease,
                ViewportCall::Detach,
            ]
        );
        assert!(session.controls().is_released());
        assert_eq!(session.state(), SessionState::Disposed);

        session.dispose(&mut viewport);
        assert_eq!(viewport.journal().len(), 3);
        assert_eq!(session.tick(pending, &mut viewport), Ok(false));
        assert!(viewport.pending().is_empty());
    }

    #[test]
    fn viewport_is_reusable_after_dispose() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut first = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        first.dispose(&mut viewport);
        let second = SceneSession::attach(&mut viewport, &Options::default());
        assert!(second.is_ok());
    }

    #[test]
    fn gestures_are_ignored_after_dispose() {
        let mut viewport = FakeViewport::new(800, 600);
        let mut session = SceneSession::attach(&mut viewport, &Options::default()).unwrap();
        session.dispose(&mut viewport);
        let eye = session.camera().eye;
        session.handle_gesture(CameraGesture::Rotate {
            delta: glam::Vec2::new(100.0, 0.0),
        });
        assert_eq!(session.camera().eye, eye);
    }
}
