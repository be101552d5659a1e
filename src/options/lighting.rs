use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fixed three-light rig: ambient, shadow-casting key, and fill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
pub struct LightingOptions {
    /// Ambient light intensity.
    #[schemars(title = "Ambient", range(min = 0.0, max = 1.5), extend("step" = 0.01))]
    pub ambient_intensity: f32,
    /// Ambient light color (linear RGB).
    #[schemars(skip)]
    pub ambient_color: [f32; 3],
    /// Key light intensity.
    #[schemars(title = "Key Light", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub key_intensity: f32,
    /// Key light position; it shines toward the origin.
    #[schemars(skip)]
    pub key_position: [f32; 3],
    /// Key light color (linear RGB).
    #[schemars(skip)]
    pub key_color: [f32; 3],
    /// Whether the key light casts shadows.
    #[schemars(title = "Key Shadows")]
    pub key_casts_shadow: bool,
    /// Fill light intensity.
    #[schemars(title = "Fill Light", range(min = 0.0, max = 2.0), extend("step" = 0.05))]
    pub fill_intensity: f32,
    /// Fill light position; it shines toward the origin.
    #[schemars(skip)]
    pub fill_position: [f32; 3],
    /// Fill light color (linear RGB).
    #[schemars(skip)]
    pub fill_color: [f32; 3],
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.6,
            ambient_color: [1.0, 1.0, 1.0],
            key_intensity: 1.0,
            key_position: [50.0, 50.0, 50.0],
            key_color: [1.0, 1.0, 1.0],
            key_casts_shadow: true,
            fill_intensity: 0.4,
            fill_position: [-50.0, 30.0, -50.0],
            fill_color: [0.85, 0.9, 1.0],
        }
    }
}
