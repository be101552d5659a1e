//! Top-level orchestration of one mounted viewer.
//!
//! [`ViewerController`] reacts to asset-URL changes, owns the scene
//! session, the asset loader and the resize subscription, and exposes the
//! loading/error state to the embedding UI. Everything here runs on the UI
//! thread; only the loader's fetch and decode happen elsewhere.

use crate::error::VitrineError;
use crate::input::{InputEvent, InputProcessor};
use crate::loader::{AssetLoader, LoadEvent, LoadedAsset};
use crate::options::Options;
use crate::scene::bounds::Aabb;
use crate::scene::normalize::Normalization;
use crate::scene::Node;
use crate::session::resize::ResizeCoordinator;
use crate::session::SceneSession;
use crate::util::frame_timing::FrameTiming;
use crate::viewport::{FrameToken, RenderError, Viewport};

/// State of the current asset.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    /// No load requested.
    Idle,
    /// Fetching or decoding.
    Loading {
        /// Download progress in `0.0..=1.0`.
        progress: f32,
    },
    /// Normalized and displayed.
    Ready {
        /// World-space bounds after normalization.
        bounds: Aabb,
        /// How the asset was fitted to the canonical size.
        normalization: Normalization,
    },
    /// The last load or normalization failed.
    Failed(String),
}

/// Coarse viewer state for the embedding UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerStatus {
    /// No asset url; nothing is rendered.
    Empty,
    /// An asset is loading; progress in `0.0..=1.0`.
    Loading(f32),
    /// The asset is displayed.
    Ready,
    /// The asset could not be shown.
    Failed,
}

type ErrorCallback = Box<dyn FnMut(&VitrineError)>;

/// Drives one viewer instance bound to a host [`Viewport`].
///
/// The host forwards its events: url changes to
/// [`set_asset_url`](Self::set_asset_url), delivered frame callbacks to
/// [`on_frame`](Self::on_frame), size changes to
/// [`on_resize`](Self::on_resize) and pointer input to
/// [`handle_input`](Self::handle_input). Loader results are picked up by
/// [`poll`](Self::poll), which `on_frame` also calls.
pub struct ViewerController<V: Viewport> {
    viewport: V,
    options: Options,
    loader: AssetLoader,
    session: Option<SceneSession<V::Renderer>>,
    resize: ResizeCoordinator,
    input: InputProcessor,
    asset_url: String,
    asset: AssetState,
    on_error: Option<ErrorCallback>,
    frame_timing: FrameTiming,
}

impl<V: Viewport> ViewerController<V> {
    /// Controller with the default HTTP/glTF loader.
    #[must_use]
    pub fn new(viewport: V, options: Options) -> Self {
        let loader = AssetLoader::new(&options.loader);
        Self::with_loader(viewport, options, loader)
    }

    /// Controller with a custom loader.
    #[must_use]
    pub fn with_loader(viewport: V, options: Options, loader: AssetLoader) -> Self {
        let resize = ResizeCoordinator::new(options.stage.fallback_height);
        Self {
            viewport,
            options,
            loader,
            session: None,
            resize,
            input: InputProcessor::new(),
            asset_url: String::new(),
            asset: AssetState::Idle,
            on_error: None,
            frame_timing: FrameTiming::new(),
        }
    }

    /// Register the callback invoked once per terminal failure.
    pub fn set_on_error(&mut self, callback: impl FnMut(&VitrineError) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    /// The host viewport.
    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Mutable access to the host viewport.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// The active scene session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&SceneSession<V::Renderer>> {
        self.session.as_ref()
    }

    /// Runtime options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The url most recently passed to
    /// [`set_asset_url`](Self::set_asset_url).
    #[must_use]
    pub fn asset_url(&self) -> &str {
        &self.asset_url
    }

    /// Detailed asset state.
    #[must_use]
    pub fn asset_state(&self) -> &AssetState {
        &self.asset
    }

    /// Coarse state for the embedding UI.
    #[must_use]
    pub fn status(&self) -> ViewerStatus {
        match &self.asset {
            AssetState::Idle => ViewerStatus::Empty,
            AssetState::Loading { progress } => ViewerStatus::Loading(*progress),
            AssetState::Ready { .. } => ViewerStatus::Ready,
            AssetState::Failed(_) => ViewerStatus::Failed,
        }
    }

    /// Whether an asset is loading.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self.asset, AssetState::Loading { .. })
    }

    /// Whether the last load failed.
    #[must_use]
    pub fn error(&self) -> bool {
        matches!(self.asset, AssetState::Failed(_))
    }

    /// Smoothed presented frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.frame_timing.fps()
    }

    /// React to a new asset url.
    ///
    /// An empty url tears the session down and shows the empty state. A
    /// new non-empty url (or the same url after a failure) ensures a
    /// session exists and starts a load that supersedes any in flight.
    pub fn set_asset_url(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            if !self.asset_url.is_empty() {
                log::info!("asset url cleared");
            }
            self.asset_url.clear();
            self.loader.cancel();
            self.teardown_session();
            self.asset = AssetState::Idle;
            return;
        }
        if url == self.asset_url && !self.error() && self.session.is_some() {
            log::debug!("asset url unchanged: {url}");
            return;
        }
        url.clone_into(&mut self.asset_url);
        self.start_load();
    }

    /// Apply loader results that arrived since the last call.
    pub fn poll(&mut self) {
        for event in self.loader.poll() {
            match event {
                LoadEvent::Progress(p) => {
                    if let AssetState::Loading { progress } = &mut self.asset {
                        *progress = p;
                    }
                }
                LoadEvent::Ready(asset) => self.apply(asset),
                LoadEvent::Failed(e) => self.fail(e.into()),
            }
        }
    }

    /// Handle a delivered frame callback.
    ///
    /// Applies pending loader results, re-syncs the viewport size, then
    /// lets the session present one frame. A lost surface is reconfigured;
    /// a fatal render error recreates the session and reloads the url.
    pub fn on_frame(&mut self, token: FrameToken) {
        self.poll();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let _ = self.resize.sync(&self.viewport, session);
        match session.tick(token, &mut self.viewport) {
            Ok(true) => self.frame_timing.end_frame(),
            Ok(false) => {}
            Err(RenderError::SurfaceLost) => session.recover_surface(),
            Err(RenderError::Skipped) => log::debug!("frame skipped"),
            Err(error @ RenderError::Fatal(_)) => {
                let error = VitrineError::from(error);
                log::error!("{error}; recreating session");
                self.teardown_session();
                if !self.asset_url.is_empty() {
                    self.start_load();
                }
            }
        }
    }

    /// Handle a viewport dimension-change notification.
    pub fn on_resize(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let _ = self.resize.on_resize(&self.viewport, session);
        }
    }

    /// Feed a pointer or modifier event to the camera controls.
    pub fn handle_input(&mut self, event: InputEvent) {
        let gesture = self.input.handle_event(event);
        if let (Some(gesture), Some(session)) = (gesture, self.session.as_mut()) {
            session.handle_gesture(gesture);
        }
    }

    /// Dispose the session, cancel loads and drop the resize
    /// subscription. The status returns to empty but the url is kept; a
    /// later [`set_asset_url`](Self::set_asset_url) starts over with a new
    /// session.
    pub fn unmount(&mut self) {
        self.loader.cancel();
        self.teardown_session();
        self.asset = AssetState::Idle;
    }

    fn start_load(&mut self) {
        if let Err(e) = self.ensure_session() {
            self.fail(e);
            return;
        }
        match self.loader.load(&self.asset_url) {
            Ok(_) => self.asset = AssetState::Loading { progress: 0.0 },
            Err(e) => self.fail(e),
        }
    }

    fn ensure_session(&mut self) -> Result<(), VitrineError> {
        if self.session.as_ref().is_some_and(SceneSession::is_active) {
            return Ok(());
        }
        let session = SceneSession::attach(&mut self.viewport, &self.options)?;
        self.session = Some(session);
        self.resize.subscribe(&mut self.viewport);
        Ok(())
    }

    fn teardown_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.dispose(&mut self.viewport);
        }
        self.resize.unsubscribe(&mut self.viewport);
    }

    fn apply(&mut self, asset: LoadedAsset) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("asset {} arrived without a session", asset.url);
            return;
        };
        let result = session.apply_asset(asset).map(|normalization| {
            let bounds = session.asset().map_or(Aabb::EMPTY, Node::world_bounds);
            (bounds, normalization)
        });
        match result {
            Ok((bounds, normalization)) => {
                self.asset = AssetState::Ready {
                    bounds,
                    normalization,
                };
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: VitrineError) {
        log::error!("{}: {error}", self.asset_url);
        self.asset = AssetState::Failed(error.to_string());
        if let Some(session) = self.session.as_mut() {
            session.clear_asset();
        }
        if let Some(callback) = self.on_error.as_mut() {
            callback(&error);
        }
    }
}

impl<V: Viewport> Drop for ViewerController<V> {
    fn drop(&mut self) {
        self.unmount();
    }
}
