use glam::Vec3;

use crate::options::CameraOptions;
use crate::scene::normalize::Normalization;

/// Default camera offset as a multiple of the normalized largest extent.
pub const FRAMING_FACTOR: f32 = 1.5;
/// Default camera height relative to its horizontal offset.
pub const FRAMING_ELEVATION: f32 = 0.7;

/// Camera placement derived from a normalized asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    /// Per-axis camera offset from the origin (`max_dim * factor`).
    pub distance: f32,
    /// Camera position.
    pub eye: Vec3,
    /// Look-at point, shared with the orbit-control target.
    pub target: Vec3,
}

/// Place the camera diagonally above a normalized asset.
///
/// `max_dim` and `height` are the asset's largest extent and vertical
/// extent after normalization. The eye sits at
/// `(d, d * elevation, d)` with `d = max_dim * factor`, looking at the
/// asset's vertical center on the Y axis.
#[must_use]
pub fn frame(max_dim: f32, height: f32, factor: f32, elevation: f32) -> Framing {
    let distance = max_dim * factor;
    Framing {
        distance,
        eye: Vec3::new(distance, distance * elevation, distance),
        target: Vec3::new(0.0, height * 0.5, 0.0),
    }
}

/// [`frame`] using the normalized extents of `n` and the factors from
/// `options`.
#[must_use]
pub fn frame_normalized(n: &Normalization, options: &CameraOptions) -> Framing {
    frame(
        n.normalized_max_dim(),
        n.normalized_size().y,
        options.framing_factor,
        options.framing_elevation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factors_place_eye_diagonally() {
        let f = frame(30.0, 12.0, FRAMING_FACTOR, FRAMING_ELEVATION);
        assert_eq!(f.distance, 45.0);
        assert_eq!(f.eye, Vec3::new(45.0, 31.5, 45.0));
        assert_eq!(f.target, Vec3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn framing_uses_normalized_extents() {
        let n = Normalization {
            center: Vec3::new(5.0, 5.0, 5.0),
            size: Vec3::new(10.0, 4.0, 2.0),
            max_dim: 10.0,
            scale: 3.0,
        };
        let f = frame_normalized(&n, &CameraOptions::default());
        assert!((f.distance - 45.0).abs() < 1e-4);
        assert!((f.target.y - 6.0).abs() < 1e-4);
        assert_eq!(f.target.x, 0.0);
        assert_eq!(f.target.z, 0.0);
    }
}
