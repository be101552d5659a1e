use glam::Vec3;

use super::Node;
use crate::error::VitrineError;

/// Default edge length of the canonical bounding volume, in world units.
pub const CANONICAL_SIZE: f32 = 30.0;

/// Measurements taken while fitting an asset to the canonical size.
///
/// `center`, `size` and `max_dim` describe the asset *before* scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Center of the original world-space bounding box.
    pub center: Vec3,
    /// Extent of the original bounding box.
    pub size: Vec3,
    /// Largest original extent.
    pub max_dim: f32,
    /// Uniform scale applied to the root.
    pub scale: f32,
}

impl Normalization {
    /// Bounding-box extent after scaling.
    #[must_use]
    pub fn normalized_size(&self) -> Vec3 {
        self.size * self.scale
    }

    /// Largest extent after scaling (equals the canonical size).
    #[must_use]
    pub fn normalized_max_dim(&self) -> f32 {
        self.max_dim * self.scale
    }
}

/// Center `root` on the vertical axis, rest it on the ground plane and
/// scale it uniformly so its largest extent equals `canonical_size`.
///
/// The root keeps its authored rotation; its translation and scale are
/// rewritten so that the world-space box ends up with `x` and `z` centered
/// on the origin and `min.y == 0`.
///
/// # Errors
///
/// Returns [`VitrineError::DegenerateAsset`] when the asset has no
/// geometry, every extent is zero, or the extents are too small (or
/// `canonical_size` is not positive) to give a finite, positive scale.
pub fn normalize(root: &mut Node, canonical_size: f32) -> Result<Normalization, VitrineError> {
    let bounds = root.world_bounds();
    if bounds.is_empty() || !bounds.min.is_finite() || !bounds.max.is_finite() {
        return Err(VitrineError::DegenerateAsset);
    }

    let size = bounds.size();
    let max_dim = size.max_element();
    if max_dim <= 0.0 {
        return Err(VitrineError::DegenerateAsset);
    }

    let center = bounds.center();
    let scale = canonical_size / max_dim;
    // Sub-normal extents overflow the scale.
    if !scale.is_finite() || scale <= 0.0 {
        log::warn!("cannot normalize: max extent {max_dim} gives scale {scale}");
        return Err(VitrineError::DegenerateAsset);
    }

    // Uniform scale commutes with the root rotation, so pre-multiplying
    // the world transform reduces to scaling translation and scale.
    let offset = Vec3::new(-center.x * scale, -bounds.min.y * scale, -center.z * scale);
    let transform = &mut root.transform;
    transform.scale *= scale;
    transform.translation = transform.translation * scale + offset;

    log::debug!("normalized asset: center={center:?} size={size:?} scale={scale}");

    Ok(Normalization {
        center,
        size,
        max_dim,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::scene::{Mesh, Transform};

    const EPS: f32 = 1e-3;

    fn box_mesh(min: Vec3, max: Vec3) -> Mesh {
        let positions = vec![
            min.to_array(),
            [max.x, min.y, min.z],
            [min.x, max.y, min.z],
            [min.x, min.y, max.z],
            max.to_array(),
        ];
        Mesh {
            positions,
            indices: vec![0, 1, 2, 0, 2, 3, 1, 4, 2],
            ..Mesh::default()
        }
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    #[test]
    fn scales_largest_extent_to_canonical_size() {
        let cases = [
            (Vec3::new(-1.0, 2.0, 5.0), Vec3::new(3.0, 4.0, 6.0)),
            (Vec3::new(100.0, -50.0, 0.0), Vec3::new(400.0, 10.0, 20.0)),
            (Vec3::splat(-0.01), Vec3::splat(0.02)),
        ];
        for (min, max) in cases {
            let mut root = Node::leaf(box_mesh(min, max));
            let n = normalize(&mut root, CANONICAL_SIZE).unwrap();
            assert_close(n.max_dim * n.scale, CANONICAL_SIZE);
            assert_close(n.normalized_max_dim(), CANONICAL_SIZE);

            let after = root.world_bounds();
            assert_close(after.max_dim(), CANONICAL_SIZE);
            assert_close(after.center().x, 0.0);
            assert_close(after.center().z, 0.0);
            assert_close(after.min.y, 0.0);
        }
    }

    #[test]
    fn respects_nested_and_rotated_transforms() {
        let mut child = Node::leaf(box_mesh(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0)));
        child.transform = Transform {
            translation: Vec3::new(10.0, 3.0, -4.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::new(1.0, 2.0, 1.0),
        };
        let mut root = Node::group(None);
        root.transform.rotation = Quat::from_rotation_z(0.25);
        root.transform.translation = Vec3::new(-7.0, 1.0, 2.0);
        root.children.push(child);

        let n = normalize(&mut root, 30.0).unwrap();
        let after = root.world_bounds();
        assert_close(after.max_dim(), 30.0);
        assert_close(after.center().x, 0.0);
        assert_close(after.center().z, 0.0);
        assert_close(after.min.y, 0.0);
        assert_close(n.normalized_size().max_element(), 30.0);
        assert_eq!(root.transform.rotation, Quat::from_rotation_z(0.25));
    }

    #[test]
    fn honors_custom_canonical_size() {
        let mut root =
            Node::leaf(box_mesh(Vec3::ZERO, Vec3::new(5.0, 10.0, 2.0)));
        let n = normalize(&mut root, 4.0).unwrap();
        assert_close(n.scale, 0.4);
        assert_close(root.world_bounds().max.y, 4.0);
    }

    #[test]
    fn zero_extent_is_degenerate() {
        let mesh = Mesh {
            positions: vec![[1.0, 1.0, 1.0]; 3],
            indices: vec![0, 1, 2],
            ..Mesh::default()
        };
        let mut root = Node::leaf(mesh);
        let before = root.transform;
        let err = normalize(&mut root, CANONICAL_SIZE).unwrap_err();
        assert!(matches!(err, VitrineError::DegenerateAsset));
        assert_eq!(root.transform, before);
        assert!(root.transform.translation.is_finite());
    }

    #[test]
    fn asset_without_geometry_is_degenerate() {
        let mut root = Node::group(Some("empty".into()));
        root.children.push(Node::group(None));
        assert!(matches!(
            normalize(&mut root, CANONICAL_SIZE),
            Err(VitrineError::DegenerateAsset)
        ));
    }

    #[test]
    fn flat_asset_still_normalizes() {
        let quad = Mesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [6.0, 0.0, 0.0],
                [6.0, 0.0, 3.0],
                [0.0, 0.0, 3.0],
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Mesh::default()
        };
        let mut root = Node::leaf(quad);
        let n = normalize(&mut root, 30.0).unwrap();
        assert_close(n.scale, 5.0);
        assert_close(root.world_bounds().min.y, 0.0);
    }

    #[test]
    fn subnormal_extent_is_degenerate_without_nan() {
        let speck = Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1e-39, 0.0, 0.0], [0.0, 0.0, 1e-39]],
            indices: vec![0, 1, 2],
            ..Mesh::default()
        };
        let mut root = Node::leaf(speck);
        assert!(matches!(
            normalize(&mut root, CANONICAL_SIZE),
            Err(VitrineError::DegenerateAsset)
        ));
        assert!(root.transform.translation.is_finite());
        assert!(root.transform.scale.is_finite());
    }

    #[test]
    fn non_positive_canonical_size_is_rejected() {
        for canonical in [0.0, -30.0, f32::NAN] {
            let mut root = Node::leaf(box_mesh(Vec3::ZERO, Vec3::ONE));
            assert!(matches!(
                normalize(&mut root, canonical),
                Err(VitrineError::DegenerateAsset)
            ));
            assert_eq!(root.transform, Transform::IDENTITY);
        }
    }
}
