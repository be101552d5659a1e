//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::viewport::RenderError;

/// Why an asset load terminated without producing a scene node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transport failure or a non-2xx HTTP status.
    Network(String),
    /// The payload was fetched but is malformed or unsupported.
    Decode(String),
    /// The request did not complete within the configured timeout.
    Timeout,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Timeout => write!(f, "request timed out"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Errors produced by the vitrine crate.
#[derive(Debug)]
pub enum VitrineError {
    /// Asset fetch or decode failure.
    Load(LoadError),
    /// The asset's bounding box has zero extent; it cannot be normalized.
    DegenerateAsset,
    /// The viewport was unavailable or already attached at session
    /// creation.
    Attach(String),
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Unrecoverable failure while presenting a frame.
    Render(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for VitrineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "asset load failed: {e}"),
            Self::DegenerateAsset => {
                write!(f, "asset has a zero-extent bounding box")
            }
            Self::Attach(msg) => write!(f, "viewport attach failed: {msg}"),
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Render(msg) => write!(f, "render error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for VitrineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Gpu(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for VitrineError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<RenderContextError> for VitrineError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<RenderError> for VitrineError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Fatal(msg) => Self::Render(msg),
            other => Self::Render(other.to_string()),
        }
    }
}

impl From<std::io::Error> for VitrineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
