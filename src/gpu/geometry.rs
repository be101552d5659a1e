//! CPU-side vertex baking for the GPU passes.
//!
//! Asset meshes are flattened into world space once per asset revision,
//! with material color folded into each vertex, and split by face culling
//! so single-sided and double-sided geometry can use separate pipelines.

use std::borrow::Cow;

use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::scene::{Material, Mesh, Node};
use crate::session::rig::{GroundPlane, Stage};

/// Vertex layout of the lit mesh pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space unit normal.
    pub normal: [f32; 3],
    /// Linear RGBA surface color.
    pub color: [f32; 4],
    /// `[metallic, roughness, receive_shadow]`.
    pub material: [f32; 3],
}

impl SceneVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x3,
    ];

    /// Vertex buffer layout matching the WGSL vertex input.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle list ready for upload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBatch {
    /// Vertices in world space.
    pub vertices: Vec<SceneVertex>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshBatch {
    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append `mesh` transformed by `world`.
    pub fn push_mesh(&mut self, mesh: &Mesh, world: Mat4) {
        if mesh.positions.is_empty() || mesh.indices.len() < 3 {
            return;
        }
        let base = self.vertices.len() as u32;
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals.iter().map(|n| Vec3::from(*n)).collect()
        } else {
            smooth_normals(mesh)
        };

        let material: Cow<'_, Material> = if mesh.needs_material_refresh {
            Cow::Owned(mesh.material.refreshed())
        } else {
            Cow::Borrowed(&mesh.material)
        };
        let base_color = Vec4::from(material.base_color);
        let colors = mesh
            .colors
            .as_ref()
            .filter(|_| material.vertex_colors && mesh.has_vertex_colors());
        let receive = if mesh.receive_shadow { 1.0 } else { 0.0 };
        let material = [material.metallic, material.roughness, receive];

        for (i, p) in mesh.positions.iter().enumerate() {
            let position = world.transform_point3(Vec3::from(*p));
            let normal = (normal_matrix * normals[i]).normalize_or(Vec3::Y);
            let color = match colors {
                Some(colors) => base_color * Vec4::from(colors[i]),
                None => base_color,
            };
            self.vertices.push(SceneVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                color: color.to_array(),
                material,
            });
        }

        // Mirroring transforms flip winding.
        let flip = world.determinant() < 0.0;
        for tri in mesh.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] + base, tri[1] + base, tri[2] + base);
            if flip {
                self.indices.extend_from_slice(&[a, c, b]);
            } else {
                self.indices.extend_from_slice(&[a, b, c]);
            }
        }
    }

    /// Two triangles covering `ground`, facing up.
    #[must_use]
    pub fn ground(ground: &GroundPlane) -> Self {
        let color = ground.color.extend(1.0).to_array();
        let vertices = ground
            .corners()
            .iter()
            .map(|c| SceneVertex {
                position: c.to_array(),
                normal: [0.0, 1.0, 0.0],
                color,
                material: [0.0, 1.0, 1.0],
            })
            .collect();
        Self {
            vertices,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
fn smooth_normals(mesh: &Mesh) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; mesh.positions.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let (pa, pb, pc) = (
            Vec3::from(mesh.positions[a]),
            Vec3::from(mesh.positions[b]),
            Vec3::from(mesh.positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y))
        .collect()
}

/// An asset flattened into world space, split by face culling.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SceneGeometry {
    /// Back-face culled meshes.
    pub single_sided: MeshBatch,
    /// Meshes drawn from both sides.
    pub double_sided: MeshBatch,
}

impl SceneGeometry {
    /// Bake every drawable leaf under `root`.
    #[must_use]
    pub fn from_node(root: &Node) -> Self {
        let mut geometry = Self::default();
        root.visit_meshes(Mat4::IDENTITY, &mut |mesh, world| {
            if mesh.material.double_sided {
                geometry.double_sided.push_mesh(mesh, world);
            } else {
                geometry.single_sided.push_mesh(mesh, world);
            }
        });
        geometry
    }

    /// Bake the stage's ground plane, if enabled.
    #[must_use]
    pub fn from_stage(stage: &Stage) -> Self {
        Self {
            single_sided: stage.ground.as_ref().map(MeshBatch::ground).unwrap_or_default(),
            double_sided: MeshBatch::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::scene::Transform;

    fn triangle(material: Material, colors: Option<Vec<[f32; 4]>>) -> Mesh {
        Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
            colors,
            indices: vec![0, 1, 2],
            material,
            ..Mesh::default()
        }
    }

    #[test]
    fn bakes_world_positions_and_derived_normals() {
        let mut node = Node::leaf(triangle(Material::default(), None));
        node.transform = Transform::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let geometry = SceneGeometry::from_node(&node);
        assert!(geometry.double_sided.is_empty());

        let batch = &geometry.single_sided;
        assert_eq!(batch.indices, vec![0, 1, 2]);
        assert_eq!(batch.vertices[1].position, [1.0, 5.0, 0.0]);
        for v in &batch.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn vertex_colors_multiply_base_color() {
        let material = Material {
            base_color: [0.5, 1.0, 1.0, 1.0],
            vertex_colors: true,
            double_sided: true,
            ..Material::default()
        };
        let colors = vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]];
        let node = Node::leaf(triangle(material, Some(colors)));
        let geometry = SceneGeometry::from_node(&node);
        assert!(geometry.single_sided.is_empty());
        assert_eq!(geometry.double_sided.vertices[0].color, [0.5, 0.0, 0.0, 1.0]);
        assert_eq!(geometry.double_sided.vertices[2].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn mirrored_transform_flips_winding_and_offsets_indices() {
        let mut root = Node::group(None);
        root.children.push(Node::leaf(triangle(Material::default(), None)));
        let mut mirrored = Node::leaf(triangle(Material::default(), None));
        mirrored.transform = Transform {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::new(-1.0, 1.0, 1.0),
        };
        root.children.push(mirrored);

        let batch = SceneGeometry::from_node(&root).single_sided;
        assert_eq!(batch.vertices.len(), 6);
        assert_eq!(batch.indices, vec![0, 1, 2, 3, 5, 4]);
    }

    #[test]
    fn flagged_materials_are_refreshed_before_baking() {
        let material = Material {
            base_color: [2.0, f32::NAN, 0.5, 1.0],
            metallic: -1.0,
            roughness: f32::INFINITY,
            ..Material::default()
        };
        let mut mesh = triangle(material, None);
        mesh.receive_shadow = true;
        let raw = SceneGeometry::from_node(&Node::leaf(mesh.clone()));
        assert_eq!(raw.single_sided.vertices[0].material[0], -1.0);

        mesh.needs_material_refresh = true;
        let refreshed = SceneGeometry::from_node(&Node::leaf(mesh));
        let vertex = refreshed.single_sided.vertices[0];
        assert_eq!(vertex.color, [1.0, 1.0, 0.5, 1.0]);
        assert_eq!(vertex.material, [0.0, 1.0, 1.0]);
    }

    #[test]
    fn only_receivers_are_marked_for_key_shadowing() {
        let mesh = triangle(Material::default(), None);
        let geometry = SceneGeometry::from_node(&Node::leaf(mesh));
        assert!(geometry.single_sided.vertices.iter().all(|v| v.material[2] == 0.0));
        let ground = MeshBatch::ground(&GroundPlane {
            size: 1.0,
            color: Vec3::ONE,
            y: 0.0,
        });
        assert!(ground.vertices.iter().all(|v| v.material[2] == 1.0));
    }

    #[test]
    fn ground_faces_up() {
        let ground = GroundPlane {
            size: 10.0,
            color: Vec3::splat(0.5),
            y: -0.01,
        };
        let batch = MeshBatch::ground(&ground);
        let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(batch.vertices[i].position));
        assert!((b - a).cross(c - a).y > 0.0);
    }
}
