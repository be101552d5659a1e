use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::framing::{FRAMING_ELEVATION, FRAMING_FACTOR};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection, orbit-control and framing parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Fraction of the remaining orbit velocity removed each frame.
    #[schemars(title = "Damping", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub damping_factor: f32,
    /// Closest allowed orbit distance.
    #[schemars(title = "Min Distance", range(min = 1.0, max = 100.0), extend("step" = 1.0))]
    pub min_distance: f32,
    /// Farthest allowed orbit distance.
    #[schemars(title = "Max Distance", range(min = 50.0, max = 1000.0), extend("step" = 10.0))]
    pub max_distance: f32,
    /// Largest angle from straight-up, in degrees. 90 keeps the camera at
    /// or above the ground plane.
    #[schemars(title = "Max Polar Angle", range(min = 10.0, max = 180.0), extend("step" = 1.0))]
    pub max_polar_angle: f32,
    /// Optional `[min, max]` azimuth bound in degrees. `None` leaves the
    /// horizontal orbit unbounded.
    #[schemars(skip)]
    pub azimuth_range: Option<[f32; 2]>,
    /// Rotation sensitivity multiplier.
    #[schemars(title = "Rotate Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    #[schemars(title = "Pan Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub pan_speed: f32,
    /// Zoom sensitivity multiplier.
    #[schemars(title = "Zoom Speed", range(min = 0.01, max = 0.5), extend("step" = 0.01))]
    pub zoom_speed: f32,
    /// Camera offset from the origin as a multiple of the normalized
    /// largest extent.
    #[schemars(skip)]
    pub framing_factor: f32,
    /// Camera height relative to its horizontal offset when framing.
    #[schemars(skip)]
    pub framing_elevation: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 2000.0,
            damping_factor: 0.05,
            min_distance: 5.0,
            max_distance: 500.0,
            max_polar_angle: 90.0,
            azimuth_range: None,
            rotate_speed: 0.5,
            pan_speed: 0.5,
            zoom_speed: 0.1,
            framing_factor: FRAMING_FACTOR,
            framing_elevation: FRAMING_ELEVATION,
        }
    }
}
