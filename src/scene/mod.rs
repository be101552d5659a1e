//! Scene graph for loaded assets.
//!
//! A loaded asset is a tree of [`Node`]s. Each node carries a local
//! [`Transform`] and, when it is a drawable leaf, a [`Mesh`] holding
//! CPU-side triangle geometry and its final [`Material`] assignment.
//! Bounding volumes are computed in [`bounds`], and [`normalize`] fits a
//! root node to the canonical size.

/// Axis-aligned bounding boxes.
pub mod bounds;
/// Center + uniform scale of an asset to a canonical bounding volume.
pub mod normalize;

use glam::{Mat4, Quat, Vec3};

use self::bounds::Aabb;

/// Translation, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Offset from the parent origin.
    pub translation: Vec3,
    /// Orientation relative to the parent.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Transform with only a translation.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Local-to-parent matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation,
            self.translation,
        )
    }
}

/// Final material assignment for a drawable leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Linear RGBA base color factor.
    pub base_color: [f32; 4],
    /// Multiply the base color by the mesh's per-vertex colors.
    pub vertex_colors: bool,
    /// Render both front and back faces.
    pub double_sided: bool,
    /// Metalness factor (0 = dielectric).
    pub metallic: f32,
    /// Roughness factor (1 = fully matte).
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0; 4],
            vertex_colors: false,
            double_sided: false,
            metallic: 0.0,
            roughness: 1.0,
        }
    }
}

impl Material {
    /// Copy with every factor forced into its valid range. Non-finite
    /// factors fall back to the defaults.
    #[must_use]
    pub fn refreshed(&self) -> Self {
        let defaults = Self::default();
        let unit = |value: f32, fallback: f32| {
            if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                fallback
            }
        };
        let mut base_color = self.base_color;
        for (c, d) in base_color.iter_mut().zip(defaults.base_color) {
            *c = unit(*c, d);
        }
        Self {
            base_color,
            vertex_colors: self.vertex_colors,
            double_sided: self.double_sided,
            metallic: unit(self.metallic, defaults.metallic),
            roughness: unit(self.roughness, defaults.roughness),
        }
    }
}

/// Triangle geometry of a drawable leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex positions in node-local space.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (may be empty; the renderer derives flat normals).
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex linear RGBA colors, when the source carries them.
    pub colors: Option<Vec<[f32; 4]>>,
    /// Triangle list indices into the vertex arrays.
    pub indices: Vec<u32>,
    /// Material used when drawing this mesh.
    pub material: Material,
    /// Whether the mesh occludes the key light.
    pub cast_shadow: bool,
    /// Whether the mesh is darkened by shadow casters.
    pub receive_shadow: bool,
    /// The renderer must rebuild its GPU material state before drawing.
    pub needs_material_refresh: bool,
}

impl Mesh {
    /// Whether the geometry carries per-vertex color data.
    #[must_use]
    pub fn has_vertex_colors(&self) -> bool {
        self.colors
            .as_ref()
            .is_some_and(|c| !c.is_empty() && c.len() == self.positions.len())
    }

    /// Number of triangles described by the index list.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A node in the asset scene graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Optional authored name.
    pub name: Option<String>,
    /// Transform relative to the parent node.
    pub transform: Transform,
    /// Geometry, when this node is a drawable leaf.
    pub mesh: Option<Mesh>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Node {
    /// Empty group node with an optional name.
    #[must_use]
    pub fn group(name: Option<String>) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Drawable leaf with an identity transform.
    #[must_use]
    pub fn leaf(mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    /// Visit every drawable leaf together with its world matrix.
    ///
    /// `parent` is the matrix of this node's parent (identity for the
    /// scene root).
    pub fn visit_meshes<F>(&self, parent: Mat4, f: &mut F)
    where
        F: FnMut(&Mesh, Mat4),
    {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            f(mesh, world);
        }
        for child in &self.children {
            child.visit_meshes(world, f);
        }
    }

    /// Visit every drawable leaf mutably, in depth-first order.
    pub fn for_each_mesh_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Mesh),
    {
        if let Some(mesh) = &mut self.mesh {
            f(mesh);
        }
        for child in &mut self.children {
            child.for_each_mesh_mut(f);
        }
    }

    /// World-space bounding box of all drawable leaves, including this
    /// node's own transform.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.visit_meshes(Mat4::IDENTITY, &mut |mesh, world| {
            for p in &mesh.positions {
                bounds.extend(world.transform_point3(Vec3::from(*p)));
            }
        });
        bounds
    }

    /// Number of drawable leaves in this subtree.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(Mat4::IDENTITY, &mut |_, _| count += 1);
        count
    }
}
