use crate::scene::{Material, Node};

/// What the preparation pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Prepared {
    /// Drawable leaves visited.
    pub meshes: usize,
    /// Leaves whose material was rebuilt for vertex colors.
    pub vertex_colored: usize,
}

/// Final material assignment for a freshly decoded asset.
///
/// Every drawable leaf casts and receives shadows. Leaves carrying
/// per-vertex colors get a white, double-sided material that multiplies in
/// those colors; every other leaf keeps its material and is flagged for a
/// refresh.
pub fn prepare(root: &mut Node) -> Prepared {
    let mut prepared = Prepared::default();
    root.for_each_mesh_mut(&mut |mesh| {
        prepared.meshes += 1;
        mesh.cast_shadow = true;
        mesh.receive_shadow = true;
        if mesh.has_vertex_colors() {
            mesh.material = Material {
                vertex_colors: true,
                double_sided: true,
                ..Material::default()
            };
            prepared.vertex_colored += 1;
        } else {
            mesh.needs_material_refresh = true;
        }
    });
    prepared
}
