//! Standalone viewer window backed by winit.
//!
//! ```no_run
//! # use vitrine::Viewer;
//! Viewer::builder()
//!     .with_url("https://example.com/models/duck.glb")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    error::VitrineError,
    gpu::WgpuSceneRenderer,
    options::Options,
    viewport::{FrameScheduler, FrameToken, ResizeSubscription, Viewport},
    InputEvent, MouseButton, ViewerController, ViewerStatus,
};

// ── Viewport ─────────────────────────────────────────────────────────────

/// [`Viewport`] over a winit window.
///
/// Frame callbacks map onto `request_redraw`; the pending token is handed
/// back to the controller on the next `RedrawRequested`.
pub struct WindowViewport {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameToken>,
    subscription: Option<ResizeSubscription>,
    attached: bool,
    closed: bool,
}

impl WindowViewport {
    /// Wrap a window.
    #[must_use]
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
            subscription: None,
            attached: false,
            closed: false,
        }
    }

    /// The wrapped window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Take the frame callback due on this redraw, if any.
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    /// Whether resize notifications are wanted.
    #[must_use]
    pub fn wants_resize(&self) -> bool {
        self.subscription.is_some()
    }

    /// Mark the window as gone; later measurements report no size.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending = None;
    }
}

impl FrameScheduler for WindowViewport {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken::new(self.next_id);
        self.pending = Some(token);
        self.window.request_redraw();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

impl Viewport for WindowViewport {
    type Renderer = WgpuSceneRenderer;

    fn client_size(&self) -> Option<(u32, u32)> {
        if self.closed {
            return None;
        }
        let logical = self
            .window
            .inner_size()
            .to_logical::<u32>(self.window.scale_factor());
        Some((logical.width, logical.height))
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn attach(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Renderer, VitrineError> {
        if self.closed {
            return Err(VitrineError::Attach("window is closed".into()));
        }
        if self.attached {
            return Err(VitrineError::Attach(
                "window already has a renderer".into(),
            ));
        }
        let renderer = pollster::block_on(WgpuSceneRenderer::create(
            self.window.clone(),
            (width, height),
        ))?;
        self.attached = true;
        Ok(renderer)
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.next_id += 1;
        let subscription = ResizeSubscription::new(self.next_id);
        self.subscription = Some(subscription);
        subscription
    }

    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription) {
        if self.subscription == Some(subscription) {
            self.subscription = None;
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    url: Option<String>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with sensible defaults (title "Vitrine", no url,
    /// default options).
    fn new() -> Self {
        Self {
            url: None,
            options: None,
            title: "Vitrine".into(),
        }
    }

    /// Set the asset url or path (`.glb` or `.gltf`).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            url: self.url,
            options: self.options,
            title: self.title,
        }
    }
}

/// A standalone window that displays one asset.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    url: Option<String>,
    options: Option<Options>,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Viewer`] if the event loop cannot be created
    /// or exits abnormally.
    pub fn run(self) -> Result<(), VitrineError> {
        let event_loop =
            EventLoop::new().map_err(|e| VitrineError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ViewerApp {
            window: None,
            controller: None,
            url: self.url.unwrap_or_default(),
            options: self.options.unwrap_or_default(),
            title: self.title,
            status: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| VitrineError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    controller: Option<ViewerController<WindowViewport>>,
    url: String,
    options: Options,
    title: String,
    /// Last status shown in the title bar.
    status: Option<ViewerStatus>,
}

impl ViewerApp {
    /// Reflect loading progress and failures in the window title.
    fn update_title(&mut self) {
        let (Some(window), Some(controller)) = (&self.window, &self.controller)
        else {
            return;
        };
        let status = controller.status();
        if self.status == Some(status) {
            return;
        }
        self.status = Some(status);
        let title = match status {
            ViewerStatus::Empty | ViewerStatus::Ready => self.title.clone(),
            ViewerStatus::Loading(p) => {
                format!("{} (loading {:.0}%)", self.title, p * 100.0)
            }
            ViewerStatus::Failed => format!("{} (failed)", self.title),
        };
        window.set_title(&title);
    }

    fn forward_input(&mut self, event: InputEvent) {
        if let Some(controller) = &mut self.controller {
            controller.handle_input(event);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (mon_size.width as f64 / scale * 0.75) as u32;
            let logical_h = (mon_size.height as f64 / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    logical_w, logical_h,
                ))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut controller = ViewerController::new(
            WindowViewport::new(window.clone()),
            self.options.clone(),
        );
        controller.set_on_error(|e| log::error!("{e}"));
        controller.set_asset_url(&self.url);

        self.window = Some(window);
        self.controller = Some(controller);
        self.update_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            if let Some(mut controller) = self.controller.take() {
                controller.unmount();
                controller.viewport_mut().close();
            }
            event_loop.exit();
            return;
        }

        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());

        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(controller) = &mut self.controller {
                    if controller.viewport().wants_resize() {
                        controller.on_resize();
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(controller) = &mut self.controller {
                    if let Some(token) = controller.viewport_mut().take_pending()
                    {
                        controller.on_frame(token);
                    } else {
                        controller.poll();
                    }
                }
                self.update_title();
            }

            WindowEvent::MouseInput { button, state, .. } => {
                self.forward_input(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale);
                self.forward_input(InputEvent::CursorMoved {
                    x: logical.x,
                    y: logical.y,
                });
            }

            WindowEvent::CursorLeft { .. } => {
                self.forward_input(InputEvent::CursorLeft);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.forward_input(InputEvent::Scroll {
                    delta: scroll_delta,
                });
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.forward_input(InputEvent::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                });
            }

            _ => (),
        }
    }
}
