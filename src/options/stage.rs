use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::normalize::CANONICAL_SIZE;

/// Static stage decoration and asset normalization parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Stage", inline)]
#[serde(default)]
pub struct StageOptions {
    /// Edge length the largest asset extent is scaled to.
    #[schemars(skip)]
    pub canonical_size: f32,
    /// Draw the ground plane under the asset.
    #[schemars(title = "Show Ground")]
    pub show_ground: bool,
    /// Draw the reference grid.
    #[schemars(title = "Show Grid")]
    pub show_grid: bool,
    /// Edge length of the square ground plane.
    #[schemars(skip)]
    pub ground_size: f32,
    /// Ground plane color (linear RGB).
    #[schemars(skip)]
    pub ground_color: [f32; 3],
    /// Edge length of the square grid.
    #[schemars(skip)]
    pub grid_size: f32,
    /// Number of grid cells along each edge.
    #[schemars(title = "Grid Divisions", range(min = 2, max = 100))]
    pub grid_divisions: u32,
    /// Color of the two center lines.
    #[schemars(skip)]
    pub grid_center_color: [f32; 3],
    /// Color of the remaining grid lines.
    #[schemars(skip)]
    pub grid_color: [f32; 3],
    /// Background clear color (linear RGBA).
    #[schemars(skip)]
    pub clear_color: [f32; 4],
    /// Height in logical pixels used when the viewport reports zero
    /// height.
    #[schemars(skip)]
    pub fallback_height: u32,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            canonical_size: CANONICAL_SIZE,
            show_ground: true,
            show_grid: true,
            ground_size: 200.0,
            ground_color: [0.93, 0.93, 0.93],
            grid_size: 100.0,
            grid_divisions: 20,
            grid_center_color: [0.53, 0.53, 0.53],
            grid_color: [0.8, 0.8, 0.8],
            clear_color: [0.96, 0.96, 0.96, 1.0],
            fallback_height: 400,
        }
    }
}
