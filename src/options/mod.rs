//! Centralized viewer options with TOML preset support.
//!
//! Camera, lighting, stage (ground, grid, canonical size) and loader
//! settings are consolidated here. Options serialize to/from TOML so a
//! viewer can be configured from a preset file.

mod camera;
mod lighting;
mod loader;
mod stage;

use std::path::Path;

pub use camera::CameraOptions;
pub use lighting::LightingOptions;
pub use loader::LoaderOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use stage::StageOptions;

use crate::error::VitrineError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[lighting]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection, orbit-control and framing parameters.
    pub camera: CameraOptions,
    /// Fixed lighting rig parameters.
    pub lighting: LightingOptions,
    /// Ground plane, grid and normalization parameters.
    pub stage: StageOptions,
    /// Asset transport parameters.
    #[schemars(skip)]
    pub loader: LoaderOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Io`] if the file cannot be read and
    /// [`VitrineError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, VitrineError> {
        let content = std::fs::read_to_string(path).map_err(VitrineError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::OptionsParse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, VitrineError> {
        toml::from_str(content)
            .map_err(|e| VitrineError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::OptionsParse`] if serialization fails and
    /// [`VitrineError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), VitrineError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VitrineError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(VitrineError::Io)?;
        }
        std::fs::write(path, content).map_err(VitrineError::Io)
    }
}
