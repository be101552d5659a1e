//! Payload decoding into the scene graph.

use glam::{Quat, Vec3};

use super::fetch::Locator;
use crate::error::LoadError;
use crate::scene::{Material, Mesh, Node, Transform};

/// Turns fetched bytes into a scene-graph root. Runs on the loader thread.
pub trait Decode: Send + Sync {
    /// Decode a complete payload fetched from `locator`.
    ///
    /// # Errors
    ///
    /// [`LoadError::Decode`] if the payload is malformed or unsupported.
    fn decode(&self, bytes: &[u8], locator: &Locator) -> Result<Node, LoadError>;
}

/// Default [`Decode`] for binary (`.glb`) and self-contained `.gltf`
/// assets.
///
/// Reads the default scene (or the first one), node transforms and every
/// triangle primitive with its positions, normals, `COLOR_0` and indices.
/// Materials carry the base color, metallic and roughness factors and the
/// double-sided flag. Non-triangle primitives are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfDecoder;

impl Decode for GltfDecoder {
    fn decode(&self, bytes: &[u8], locator: &Locator) -> Result<Node, LoadError> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| LoadError::Decode("document has no scene".into()))?;

        let name = scene
            .name()
            .map_or_else(|| locator.to_string(), str::to_owned);
        let mut root = Node::group(Some(name));
        root.children = scene
            .nodes()
            .map(|node| convert_node(&node, &buffers))
            .collect();
        log::debug!(
            "decoded {locator}: {} nodes, {} meshes",
            document.nodes().len(),
            root.mesh_count()
        );
        Ok(root)
    }
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut out = Node {
        name: node.name().map(str::to_owned),
        transform: Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
        mesh: None,
        children: Vec::new(),
    };

    if let Some(mesh) = node.mesh() {
        let mut primitives: Vec<Mesh> = mesh
            .primitives()
            .filter_map(|p| convert_primitive(&p, buffers))
            .collect();
        if primitives.len() == 1 {
            out.mesh = primitives.pop();
        } else {
            out.children.extend(primitives.into_iter().map(Node::leaf));
        }
    }
    out.children
        .extend(node.children().map(|child| convert_node(&child, buffers)));
    out
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Option<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::debug!("skipping {:?} primitive", primitive.mode());
        return None;
    }
    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let mut normals: Vec<[f32; 3]> =
        reader.read_normals().map(Iterator::collect).unwrap_or_default();
    if normals.len() != positions.len() {
        normals.clear();
    }
    let colors = reader
        .read_colors(0)
        .map(|c| c.into_rgba_f32().collect::<Vec<_>>());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.iter().any(|&i| i as usize >= positions.len()) {
        log::warn!("skipping primitive with out-of-range indices");
        return None;
    }

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    Some(Mesh {
        positions,
        normals,
        colors,
        indices,
        material: Material {
            base_color: pbr.base_color_factor(),
            vertex_colors: false,
            double_sided: material.double_sided(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
        },
        ..Mesh::default()
    })
}
