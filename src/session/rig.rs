//! Fixed lighting rig and static stage decoration.
//!
//! Both are created once per session and are never part of the loaded
//! asset, so they stay visible while a load is in flight or after it fails.

use glam::Vec3;

use crate::options::{LightingOptions, StageOptions};

/// Ground plane sits just below the grid to avoid depth fighting.
const GROUND_OFFSET: f32 = -0.01;

/// Uniform ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB color.
    pub color: Vec3,
    /// Intensity multiplier.
    pub intensity: f32,
}

/// Directional light shining from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Light position; only its direction from the origin matters.
    pub position: Vec3,
    /// Linear RGB color.
    pub color: Vec3,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Whether this light casts shadows.
    pub casts_shadow: bool,
}

impl DirectionalLight {
    /// Unit vector from a lit surface toward the light.
    #[must_use]
    pub fn to_light(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

/// Ambient + key + fill lighting shared by every frame of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    /// Ambient term.
    pub ambient: AmbientLight,
    /// Main shadow-casting light.
    pub key: DirectionalLight,
    /// Softer light from the opposite side.
    pub fill: DirectionalLight,
}

impl LightingRig {
    /// Build the rig from lighting options.
    #[must_use]
    pub fn from_options(options: &LightingOptions) -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::from(options.ambient_color),
                intensity: options.ambient_intensity,
            },
            key: DirectionalLight {
                position: Vec3::from(options.key_position),
                color: Vec3::from(options.key_color),
                intensity: options.key_intensity,
                casts_shadow: options.key_casts_shadow,
            },
            fill: DirectionalLight {
                position: Vec3::from(options.fill_position),
                color: Vec3::from(options.fill_color),
                intensity: options.fill_intensity,
                casts_shadow: false,
            },
        }
    }
}

/// Colored line-list vertex used for the grid.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Linear RGB color.
    pub color: [f32; 3],
}

/// Square ground plane centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    /// Edge length.
    pub size: f32,
    /// Linear RGB color.
    pub color: Vec3,
    /// Height of the plane.
    pub y: f32,
}

impl GroundPlane {
    /// Corners in counter-clockwise order seen from above.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 4] {
        let h = self.size * 0.5;
        [
            Vec3::new(-h, self.y, h),
            Vec3::new(h, self.y, h),
            Vec3::new(h, self.y, -h),
            Vec3::new(-h, self.y, -h),
        ]
    }
}

/// Square reference grid on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Edge length.
    pub size: f32,
    /// Cells along each edge.
    pub divisions: u32,
    /// Color of the lines through the origin.
    pub center_color: Vec3,
    /// Color of every other line.
    pub color: Vec3,
}

impl Grid {
    /// Line-list vertices: `divisions + 1` lines along each axis.
    #[must_use]
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        let divisions = self.divisions.max(1);
        let step = self.size / divisions as f32;
        let half = self.size * 0.5;
        let center = divisions / 2;
        let mut out = Vec::with_capacity((divisions as usize + 1) * 4);
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let color = if divisions % 2 == 0 && i == center {
                self.center_color
            } else {
                self.color
            }
            .to_array();
            out.push(LineVertex { position: [-half, 0.0, k], color });
            out.push(LineVertex { position: [half, 0.0, k], color });
            out.push(LineVertex { position: [k, 0.0, -half], color });
            out.push(LineVertex { position: [k, 0.0, half], color });
        }
        out
    }
}

/// Static decoration drawn under every asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    /// Ground plane, if enabled.
    pub ground: Option<GroundPlane>,
    /// Reference grid, if enabled.
    pub grid: Option<Grid>,
    /// Background clear color (linear RGBA).
    pub clear_color: [f32; 4],
}

impl Stage {
    /// Build the stage from options.
    #[must_use]
    pub fn from_options(options: &StageOptions) -> Self {
        Self {
            ground: options.show_ground.then(|| GroundPlane {
                size: options.ground_size,
                color: Vec3::from(options.ground_color),
                y: GROUND_OFFSET,
            }),
            grid: options.show_grid.then(|| Grid {
                size: options.grid_size,
                divisions: options.grid_divisions,
                center_color: Vec3::from(options.grid_center_color),
                color: Vec3::from(options.grid_color),
            }),
            clear_color: options.clear_color,
        }
    }
}
