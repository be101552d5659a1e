use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Asset transport parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderOptions {
    /// Origin (and optional path prefix) that relative asset URLs resolve
    /// against, e.g. `https://assets.example.com/models/`. Without a base,
    /// non-URL locators are read from the local filesystem.
    pub base_url: Option<String>,
    /// Whole-request timeout in seconds (connect + body).
    pub timeout_secs: f32,
}

/// Default whole-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: f32 = 30.0;

/// Shortest timeout handed to the transport.
const MIN_TIMEOUT_SECS: f32 = 0.001;

impl LoaderOptions {
    /// Request timeout as a [`Duration`].
    ///
    /// Values below one millisecond are raised to it; NaN and values too
    /// large for a `Duration` fall back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        let secs = f64::from(self.timeout_secs.max(MIN_TIMEOUT_SECS));
        Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            log::warn!(
                "timeout_secs = {} is out of range; using {DEFAULT_TIMEOUT_SECS}",
                self.timeout_secs
            );
            Duration::from_secs_f32(DEFAULT_TIMEOUT_SECS)
        })
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
