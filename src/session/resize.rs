//! Keeps camera aspect and renderer surface in step with the viewport.

use super::SceneSession;
use crate::viewport::{ResizeSubscription, Viewport};

/// Logical and physical size of a viewport at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Size in logical pixels. Drives the camera aspect ratio.
    pub logical: (u32, u32),
    /// Size in physical pixels. Drives the renderer surface.
    pub physical: (u32, u32),
}

impl Dimensions {
    /// Read the current size of `viewport`.
    ///
    /// A zero height is replaced with `fallback_height` and a zero width
    /// with one pixel. Returns `None` when the viewport reports no size.
    #[must_use]
    pub fn measure<V: Viewport + ?Sized>(
        viewport: &V,
        fallback_height: u32,
    ) -> Option<Self> {
        let (width, height) = viewport.client_size()?;
        let height = if height == 0 {
            fallback_height.max(1)
        } else {
            height
        };
        let width = width.max(1);
        let scale = viewport.scale_factor();
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let to_physical = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
        Some(Self {
            logical: (width, height),
            physical: (to_physical(width), to_physical(height)),
        })
    }
}

/// Owns the resize subscription of one mounted viewer.
#[derive(Debug)]
pub struct ResizeCoordinator {
    subscription: Option<ResizeSubscription>,
    fallback_height: u32,
}

impl ResizeCoordinator {
    /// Unsubscribed coordinator.
    #[must_use]
    pub fn new(fallback_height: u32) -> Self {
        Self {
            subscription: None,
            fallback_height,
        }
    }

    /// Whether dimension-change notifications are currently delivered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribe to dimension changes. No-op if already subscribed.
    pub fn subscribe<V: Viewport>(&mut self, viewport: &mut V) {
        if self.subscription.is_none() {
            self.subscription = Some(viewport.subscribe_resize());
            log::debug!("resize subscription added");
        }
    }

    /// Remove the subscription, if any.
    pub fn unsubscribe<V: Viewport>(&mut self, viewport: &mut V) {
        if let Some(subscription) = self.subscription.take() {
            viewport.unsubscribe_resize(subscription);
            log::debug!("resize subscription removed");
        }
    }

    /// Handle a dimension-change notification. Ignored without an active
    /// subscription. Returns `true` if the session was updated.
    pub fn on_resize<V: Viewport>(
        &self,
        viewport: &V,
        session: &mut SceneSession<V::Renderer>,
    ) -> bool {
        if self.subscription.is_none() {
            log::warn!("resize notification without subscription ignored");
            return false;
        }
        self.sync(viewport, session)
    }

    /// Bring the session in line with the viewport's current size.
    /// Returns `true` if anything changed.
    pub fn sync<V: Viewport>(
        &self,
        viewport: &V,
        session: &mut SceneSession<V::Renderer>,
    ) -> bool {
        match Dimensions::measure(viewport, self.fallback_height) {
            Some(dimensions) => session.apply_dimensions(dimensions),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::testing::{FakeViewport, ViewportCall};
    use crate::viewport::SceneRenderer;

    #[test]
    fn measure_applies_scale_and_fallback() {
        let mut viewport = FakeViewport::new(800, 0);
        viewport.scale = 2.0;
        let dims = Dimensions::measure(&viewport, 400).unwrap();
        assert_eq!(dims.logical, (800, 400));
        assert_eq!(dims.physical, (1600, 800));
    }

    #[test]
    fn measure_without_size_is_none() {
        let mut viewport = FakeViewport::new(800, 600);
        viewport.size = None;
        assert!(Dimensions::measure(&viewport, 400).is_none());
    }

    #[test]
    fn resize_updates_aspect_and_surface_but_not_eye() {
        let mut viewport = FakeViewport::new(800, 600);
        let options = Options::default();
        let mut session = SceneSession::attach(&mut viewport, &options).unwrap();
        let mut resize = ResizeCoordinator::new(options.stage.fallback_height);
        resize.subscribe(&mut viewport);
        let eye = session.camera().eye;
        let target = session.camera().target;

        viewport.size = Some((1000, 500));
        assert!(resize.on_resize(&viewport, &mut session));
        assert!((session.camera().aspect - 2.0).abs() < 1e-6);
        assert_eq!(session.renderer().surface_size(), (1000, 500));
        assert_eq!(session.camera().eye, eye);
        assert_eq!(session.camera().target, target);

        // Unchanged size is a no-op.
        assert!(!resize.on_resize(&viewport, &mut session));
    }

    #[test]
    fn notifications_after_unsubscribe_are_ignored() {
        let mut viewport = FakeViewport::new(800, 600);
        let options = Options::default();
        let mut session = SceneSession::attach(&mut viewport, &options).unwrap();
        let mut resize = ResizeCoordinator::new(400);
        resize.subscribe(&mut viewport);
        resize.subscribe(&mut viewport);
        resize.unsubscribe(&mut viewport);
        resize.unsubscribe(&mut viewport);

        let subscribes = viewport
            .journal()
            .iter()
            .filter(|c| matches!(c, ViewportCall::Subscribe))
            .count();
        let unsubscribes = viewport
            .journal()
            .iter()
            .filter(|c| matches!(c, ViewportCall::Unsubscribe))
            .count();
        assert_eq!((subscribes, unsubscribes), (1, 1));

        viewport.size = Some((300, 300));
        assert!(!resize.on_resize(&viewport, &mut session));
        assert_eq!(session.renderer().surface_size(), (800, 600));
    }
}
