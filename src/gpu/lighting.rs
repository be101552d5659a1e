use crate::session::rig::{DirectionalLight, LightingRig};

/// Lighting uniform shared by the mesh shader.
/// NOTE: Must match the WGSL `Lighting` struct exactly (80 bytes, five
/// `vec4<f32>` fields, no implicit padding).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    /// Ambient color premultiplied by intensity; `w` unused.
    pub ambient: [f32; 4],
    /// Unit direction toward the key light; `w` = intensity.
    pub key_dir: [f32; 4],
    /// Key light color; `w` = 1 if the key light casts shadows.
    pub key_color: [f32; 4],
    /// Unit direction toward the fill light; `w` = intensity.
    pub fill_dir: [f32; 4],
    /// Fill light color; `w` unused.
    pub fill_color: [f32; 4],
}

fn direction(light: &DirectionalLight) -> [f32; 4] {
    light.to_light().extend(light.intensity).to_array()
}

impl LightingUniform {
    /// Pack a lighting rig for upload.
    #[must_use]
    pub fn from_rig(rig: &LightingRig) -> Self {
        let ambient = rig.ambient.color * rig.ambient.intensity;
        Self {
            ambient: ambient.extend(0.0).to_array(),
            key_dir: direction(&rig.key),
            key_color: rig
                .key
                .color
                .extend(if rig.key.casts_shadow { 1.0 } else { 0.0 })
                .to_array(),
            fill_dir: direction(&rig.fill),
            fill_color: rig.fill.color.extend(0.0).to_array(),
        }
    }
}
